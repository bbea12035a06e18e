//! Logging of error values.
use super::{LogOptions, Logger};
use crate::record::LogLevel;
use serde_json::{json, Map, Value};
use std::error::Error;

const EXCEPTION_CATEGORY: &str = "Exception";

impl Logger {
    /// Logs `error` at [`LogLevel::Error`].
    ///
    /// The message defaults to `Exception: {error}` and the category to
    /// `Exception`. The payload carries the error's type, message, debug
    /// output and cause; data supplied in `options` is kept under
    /// `CustomData`.
    #[track_caller]
    pub fn log_exception<E>(&self, error: &E, message: Option<&str>, mut options: LogOptions)
    where
        E: Error + ?Sized,
    {
        let message = match message {
            Some(message) => message.to_string(),
            None => format!("Exception: {}", error),
        };
        if options.category.is_none() {
            options.category = Some(EXCEPTION_CATEGORY.to_string());
        }
        options.data = Some(exception_payload(error, options.data.take()));

        self.log(message, LogLevel::Error, options);
    }
}

/// Builds the `{"Exception": {...}, "CustomData": ...}` payload for an error.
pub fn exception_payload<E>(error: &E, custom: Option<Value>) -> Value
where
    E: Error + ?Sized,
{
    let mut payload = Map::new();
    payload.insert(
        "Exception".to_string(),
        json!({
            "Type": std::any::type_name::<E>(),
            "Message": error.to_string(),
            "StackTrace": format!("{:?}", error),
            "InnerException": error.source().map(|cause| cause.to_string()),
        }),
    );
    if let Some(custom) = custom {
        payload.insert("CustomData".to_string(), custom);
    }
    Value::Object(payload)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{test_config, FakeFactory};
    use super::*;
    use crate::error::{ChannelError, DeliveryError};

    #[test]
    fn test_payload_describes_error_and_cause() {
        let error = ChannelError::Bind {
            port: 80,
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
        };
        let payload = exception_payload(&error, None);

        let exception = &payload["Exception"];
        assert!(exception["Type"].as_str().unwrap().ends_with("ChannelError"));
        assert_eq!(
            exception["Message"],
            "failed to bind log viewer on port 80: address in use"
        );
        assert!(exception["StackTrace"].as_str().unwrap().contains("Bind"));
        assert_eq!(exception["InnerException"], "address in use");
        assert!(payload.get("CustomData").is_none());
    }

    #[test]
    fn test_payload_without_cause() {
        let error = DeliveryError::Channel(ChannelError::NotRunning);
        let payload = exception_payload(&error, Some(json!({ "Attempt": 3 })));

        assert_eq!(payload["Exception"]["InnerException"], Value::Null);
        assert_eq!(payload["CustomData"]["Attempt"], 3);
    }

    #[test]
    fn test_log_exception_defaults() {
        let factory = FakeFactory::new();
        let logger = Logger::with_factory(test_config(), factory.clone());
        assert!(logger.initialize());

        let error = "abc".parse::<u32>().unwrap_err();
        logger.log_exception(&error, None, LogOptions::new());
        logger.log_exception(
            &error,
            Some("parsing failed"),
            LogOptions::new()
                .category("Parsing")
                .data(json!({ "Input": "abc" })),
        );

        let sent = factory.channel().unwrap().sent_records();
        let first = &sent[1];
        assert_eq!(first.level(), LogLevel::Error);
        assert_eq!(first.message(), format!("Exception: {}", error));
        assert_eq!(first.category(), "Exception");
        assert_eq!(first.data()["Exception"]["Message"], error.to_string());
        assert!(first.location().starts_with("exception.rs::"));

        let second = &sent[2];
        assert_eq!(second.message(), "parsing failed");
        assert_eq!(second.category(), "Parsing");
        assert_eq!(second.data()["CustomData"]["Input"], "abc");
    }

    #[test]
    fn test_log_exception_with_trait_object() {
        let factory = FakeFactory::new();
        let logger = Logger::with_factory(test_config(), factory.clone());
        assert!(logger.initialize());

        let error: Box<dyn Error + Send + Sync> = "boom".into();
        logger.log_exception(&*error, None, LogOptions::new());

        let sent = factory.channel().unwrap().sent_records();
        assert_eq!(sent[1].message(), "Exception: boom");
    }
}
