use std::fmt::Display;
use std::str::FromStr;

pub const ADDR_ENV: &str = "CANVAS_RELAY_ADDR";
pub const QUEUE_ENV: &str = "CANVAS_RELAY_QUEUE";

const DEFAULT_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    pub bind_addr: String,
    /// Capacity of the relay loop's command queue.
    pub queue_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Invalid values are logged and replaced by their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let bind_addr = match lookup(ADDR_ENV) {
            Some(raw) if !raw.trim().is_empty() => raw.trim().to_string(),
            Some(_) => {
                log::warn!("{} is set but empty, using {}", ADDR_ENV, defaults.bind_addr);
                defaults.bind_addr
            }
            None => defaults.bind_addr,
        };
        let queue_capacity = parse_or(
            QUEUE_ENV,
            lookup(QUEUE_ENV),
            defaults.queue_capacity,
            |capacity: &usize| *capacity > 0,
        );
        Self {
            bind_addr,
            queue_capacity,
        }
    }
}

fn parse_or<T, V>(key: &str, raw: Option<String>, default: T, valid: V) -> T
where
    T: FromStr + Display,
    V: Fn(&T) -> bool,
{
    let raw = match raw {
        Some(raw) => raw,
        None => return default,
    };
    match raw.trim().parse::<T>() {
        Ok(value) if valid(&value) => value,
        _ => {
            log::warn!("{}={:?} is invalid, using {}", key, raw, default);
            default
        }
    }
}
