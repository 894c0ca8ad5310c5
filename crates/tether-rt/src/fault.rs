//! Faults raised by module implementations.
//!
//! A fault unwinds out of the implementation and is caught at the bridge
//! boundary: synchronous calls report it as [`BridgeError::Exception`],
//! asynchronous calls reject their promise with it.
//!
//! [`BridgeError::Exception`]: crate::BridgeError::Exception

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Payload carried by [`throw!`](crate::throw).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub message: String,
}

impl Fault {
    pub fn new(message: impl Into<String>) -> Self {
        Fault { message: message.into() }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Raise a fault from inside a module method.
#[macro_export]
macro_rules! throw {
    ($($arg:tt)*) => {
        ::std::panic::panic_any($crate::Fault::new(::std::format!($($arg)*)))
    };
}

/// Run `f`, turning any unwinding fault into its message.
pub fn catch_fault<R>(f: impl FnOnce() -> R) -> Result<R, String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(fault_message)
}

fn fault_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(fault) = payload.downcast_ref::<Fault>() {
        fault.message.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown fault".to_string()
    }
}

/// Why an asynchronous call did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub message: String,
}

impl Rejection {
    pub fn new(message: impl Into<String>) -> Self {
        Rejection { message: message.into() }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Rejection {}

/// The outcome of an asynchronous method.
pub type Promise<T> = Result<T, Rejection>;

pub mod promise {
    use super::{Promise, Rejection};
    use crate::marshal::IntoHost;
    use crate::HostValue;

    pub fn resolve<T>(value: T) -> Promise<T> {
        Ok(value)
    }

    pub fn reject<T>(message: impl Into<String>) -> Promise<T> {
        Err(Rejection::new(message))
    }

    /// Encode the resolved value for the host.
    pub fn settle<T: IntoHost>(promise: Promise<T>) -> Promise<HostValue> {
        promise.map(IntoHost::into_host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_fault_messages() {
        assert_eq!(catch_fault(|| 3), Ok(3));
        assert_eq!(catch_fault(|| -> () { crate::throw!("bad input {}", 7) }), Err("bad input 7".to_string()));
        assert_eq!(catch_fault(|| -> () { panic!("plain") }), Err("plain".to_string()));
        assert_eq!(catch_fault(|| -> () { panic!("{}", String::from("owned")) }), Err("owned".to_string()));
        assert_eq!(catch_fault(|| -> () { panic::panic_any(42u8) }), Err("unknown fault".to_string()));
    }

    #[test]
    fn test_settle() {
        assert_eq!(promise::settle(promise::resolve(2.0)), Ok(crate::HostValue::Number(2.0)));
        assert_eq!(promise::settle::<f64>(promise::reject("no")), Err(Rejection::new("no")));
    }
}
