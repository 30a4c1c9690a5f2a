use std::{self, fmt, result};

use crate::Result;

/// Short form to compose Error values.
///
/// Here are few possible ways:
///
/// ```ignore
/// err!(InsufficientBytes, desc: "for payload {}", len);
/// ```
///
/// ```ignore
/// err!(MalformedPacket, code: MalformedPacket, "qos={}", qos);
/// ```
///
/// ```ignore
/// err!(IOError, cause: err, "from addr:{}", ip_addr);
/// ```
///
/// ```ignore
/// err!(IOError, try: stream.flush(), "flush {}", raddr);
/// ```
#[macro_export]
macro_rules! err {
    ($v:ident, code: $code:ident, cause: $cause:expr, $($args:expr),+) => {{
        let kind = ErrorKind::$v;
        let e = Error {
            kind,
            description: format!($($args),+),
            code: Some(ReasonCode::$code),
            cause: Some(Box::new($cause)),
        };

        log_error!(e);
        Err(e)
    }};
    ($v:ident, try: $res:expr, $($args:expr),+) => {{
        match $res {
            Ok(val) => Ok(val),
            Err(err) => {
                let e = Error {
                    kind: ErrorKind::$v,
                    description: format!($($args),+),
                    cause: Some(Box::new(err)),
                    ..Error::default()
                };
                log_error!(e);
                Err(e)
            }
        }
    }};
    ($v:ident, try: $res:expr) => {{
        match $res {
            Ok(val) => Ok(val),
            Err(err) => {
                let e = Error {
                    kind: ErrorKind::$v,
                    description: err.to_string(),
                    cause: Some(Box::new(err)),
                    ..Error::default()
                };
                log_error!(e);
                Err(e)
            }
        }
    }};
    ($v:ident, code: $code:ident, $($args:expr),+) => {{
        let kind = ErrorKind::$v;
        let description = format!($($args),+);
        let e = Error {
            kind,
            description,
            code: Some(ReasonCode::$code),
            ..Error::default()
        };

        log_error!(e);
        Err(e)
    }};
    ($v:ident, cause: $cause:expr, $($args:expr),+) => {{
        let kind = ErrorKind::$v;
        let description = format!($($args),+);
        let e = Error {
            kind,
            description,
            cause: Some(Box::new($cause)),
            ..Error::default()
        };

        log_error!(e);
        Err(e)
    }};
    ($v:ident, desc: $($args:expr),+) => {{
        let kind = ErrorKind::$v;
        let description = format!($($args),+);
        let e = Error {
            kind,
            description,
            ..Error::default()
        };

        log_error!(e);
        Err(e)
    }};
}

/// Log a freshly composed error, timeouts are logged at debug level.
#[macro_export]
macro_rules! log_error {
    ($e:ident) => {{
        use log::{debug, error};

        match $e.kind {
            ErrorKind::Timeout => debug!("{}: {}", $e.kind, $e.description),
            _ => {
                error!("{}: {}", $e.kind, $e.description);
                match &$e.cause {
                    Some(cause) => error!("cause:{}", cause.to_string()),
                    None => (),
                }
            }
        }
    }};
}

/// Error that is part of [Result] type.
pub struct Error {
    pub(crate) kind: ErrorKind,
    pub(crate) description: String,
    pub(crate) code: Option<ReasonCode>,
    pub(crate) cause: Option<Box<dyn std::error::Error + Send>>,
}

impl Default for Error {
    fn default() -> Error {
        Error {
            kind: ErrorKind::InvalidInput,
            description: String::default(),
            code: None,
            cause: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "{}:{}", self.kind, self.description)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        let code = self.code.map(|c| c.to_string()).unwrap_or("-".to_string());
        write!(f, "<{},{},{}>", self.kind, code, self.description)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

impl From<std::num::TryFromIntError> for Error {
    fn from(val: std::num::TryFromIntError) -> Self {
        Error {
            kind: ErrorKind::TryFromIntError,
            description: val.to_string(),
            cause: Some(Box::new(val)),
            ..Error::default()
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(val: std::io::Error) -> Self {
        use std::io::ErrorKind as IoKind;

        let kind = match val.kind() {
            IoKind::WouldBlock | IoKind::TimedOut => ErrorKind::Timeout,
            IoKind::UnexpectedEof
            | IoKind::ConnectionReset
            | IoKind::ConnectionAborted
            | IoKind::BrokenPipe
            | IoKind::NotConnected => ErrorKind::Disconnected,
            _ => ErrorKind::IOError,
        };
        Error {
            kind,
            description: val.to_string(),
            cause: Some(Box::new(val)),
            ..Error::default()
        }
    }
}

impl Error {
    /// Return the error kind, caller should know how to handle it.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Return error kinds from this error and all of the root causes that are
    /// also of this type.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        let mut kinds = vec![self.kind];
        let cause = self.cause.as_ref().and_then(|err| err.downcast_ref::<Error>());
        if let Some(err) = cause {
            kinds.extend_from_slice(&err.kinds());
        }
        kinds
    }

    /// Reason code as defined by `MQTT-spec`.
    pub fn code(&self) -> ReasonCode {
        self.code.unwrap_or(ReasonCode::UnspecifiedError)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn has(&self, kind: ErrorKind) -> bool {
        self.kinds().contains(&kind)
    }

    /// Read timeout, the expected outcome of a "no message should arrive" step.
    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }
}

/// Error kind expected to be handled by calling functions.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    // general error
    InvalidInput,
    FailConvert,
    // mqtt errors
    MalformedPacket,
    ProtocolError,
    UnsupportedProtocolVersion,
    InsufficientBytes,
    UnexpectedPacket,
    // conformance
    ConformanceFailure,
    // network error
    Timeout,
    Disconnected,
    // chain of error
    TryFromIntError,
    IOError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        use ErrorKind::*;

        match self {
            // general error
            InvalidInput => write!(f, "InvalidInput"),
            FailConvert => write!(f, "FailConvert"),
            // mqtt errors
            ProtocolError => write!(f, "ProtocolError"),
            UnsupportedProtocolVersion => write!(f, "UnsupportedProtocolVersion"),
            InsufficientBytes => write!(f, "InsufficientBytes"),
            MalformedPacket => write!(f, "MalformedPacket"),
            UnexpectedPacket => write!(f, "UnexpectedPacket"),
            // conformance
            ConformanceFailure => write!(f, "ConformanceFailure"),
            // network error
            Timeout => write!(f, "Timeout"),
            Disconnected => write!(f, "Disconnected"),
            // chain of error
            TryFromIntError => write!(f, "TryFromIntError"),
            IOError => write!(f, "IOError"),
        }
    }
}

/// ReasonCode defined by `MQTT-spec`, each variant defines error value.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
pub enum ReasonCode {
    Success = 0x00, // NormalDisconnect, QoS0
    QoS1 = 0x1,
    QoS2 = 0x02,
    DiconnectWillMessage = 0x04,
    NoMatchingSubscribers = 0x10,
    NoSubscriptionExisted = 0x11,
    ContinueAuthentication = 0x18,
    ReAuthenticate = 0x19,
    UnspecifiedError = 0x80,
    MalformedPacket = 0x81,
    ProtocolError = 0x82,
    ImplementationError = 0x83,
    UnsupportedProtocolVersion = 0x84,
    InvalidClientID = 0x85,
    BadLogin = 0x86,
    NotAuthorized = 0x87,
    ServerNotAvailable = 0x88,
    ServerBusy = 0x89,
    Banned = 0x8A,
    ServerShutdown = 0x8B,
    BadAuthenticationMethod = 0x8C,
    KeepAliveTimeout = 0x8D,
    SessionTakenOver = 0x8E,
    InvalidTopicFilter = 0x8F,
    TopicNameInvalid = 0x90,
    PacketIdInuse = 0x91,
    PacketIdNotFound = 0x92,
    ExceededReceiveMaximum = 0x93,
    TopicAliasInvalid = 0x94,
    PacketTooLarge = 0x95,
    ExceedMessageRate = 0x96,
    QuotaExceeded = 0x97,
    AdminAction = 0x98,
    PayloadFormatInvalid = 0x99,
    RetainNotSupported = 0x9A,
    QoSNotSupported = 0x9B,
    UseAnotherServer = 0x9C,
    ServerMoved = 0x9D,
    UnsupportedSharedSubscription = 0x9E,
    ExceedConnectionRate = 0x9F,
    ExceedMaximumConnectTime = 0xA0,
    SubscriptionIdNotSupported = 0xA1,
    WildcardSubscriptionsNotSupported = 0xA2,
}

impl TryFrom<u8> for ReasonCode {
    type Error = Error;

    fn try_from(val: u8) -> Result<ReasonCode> {
        use ReasonCode::*;

        let code = match val {
            0x00 => Success,
            0x01 => QoS1,
            0x02 => QoS2,
            0x04 => DiconnectWillMessage,
            0x10 => NoMatchingSubscribers,
            0x11 => NoSubscriptionExisted,
            0x18 => ContinueAuthentication,
            0x19 => ReAuthenticate,
            0x80 => UnspecifiedError,
            0x81 => MalformedPacket,
            0x82 => ProtocolError,
            0x83 => ImplementationError,
            0x84 => UnsupportedProtocolVersion,
            0x85 => InvalidClientID,
            0x86 => BadLogin,
            0x87 => NotAuthorized,
            0x88 => ServerNotAvailable,
            0x89 => ServerBusy,
            0x8A => Banned,
            0x8B => ServerShutdown,
            0x8C => BadAuthenticationMethod,
            0x8D => KeepAliveTimeout,
            0x8E => SessionTakenOver,
            0x8F => InvalidTopicFilter,
            0x90 => TopicNameInvalid,
            0x91 => PacketIdInuse,
            0x92 => PacketIdNotFound,
            0x93 => ExceededReceiveMaximum,
            0x94 => TopicAliasInvalid,
            0x95 => PacketTooLarge,
            0x96 => ExceedMessageRate,
            0x97 => QuotaExceeded,
            0x98 => AdminAction,
            0x99 => PayloadFormatInvalid,
            0x9A => RetainNotSupported,
            0x9B => QoSNotSupported,
            0x9C => UseAnotherServer,
            0x9D => ServerMoved,
            0x9E => UnsupportedSharedSubscription,
            0x9F => ExceedConnectionRate,
            0xA0 => ExceedMaximumConnectTime,
            0xA1 => SubscriptionIdNotSupported,
            0xA2 => WildcardSubscriptionsNotSupported,
            val => err!(MalformedPacket, code: MalformedPacket, "reason-code {:x}", val)?,
        };

        Ok(code)
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        use ReasonCode::*;

        let s = match self {
            Success => "Success",
            QoS1 => "Granted QoS 1",
            QoS2 => "Granted QoS 2",
            DiconnectWillMessage => "Disconnect with Will Message",
            NoMatchingSubscribers => "No matching subscribers",
            NoSubscriptionExisted => "No subscription existed",
            ContinueAuthentication => "Continue authentication",
            ReAuthenticate => "Re-authenticate",
            UnspecifiedError => "Unspecified error",
            MalformedPacket => "Malformed Packet",
            ProtocolError => "Protocol Error",
            ImplementationError => "Implementation specific error",
            UnsupportedProtocolVersion => "Unsupported Protocol Version",
            InvalidClientID => "Client Identifier not valid",
            BadLogin => "Bad User Name or Password",
            NotAuthorized => "Not authorized",
            ServerNotAvailable => "Server unavailable",
            ServerBusy => "Server busy",
            Banned => "Banned",
            ServerShutdown => "Server shutting down",
            BadAuthenticationMethod => "Bad authentication method",
            KeepAliveTimeout => "Keep Alive timeout",
            SessionTakenOver => "Session taken over",
            InvalidTopicFilter => "Topic Filter invalid",
            TopicNameInvalid => "Topic Name invalid",
            PacketIdInuse => "Packet Identifier in use",
            PacketIdNotFound => "Packet Identifier not found",
            ExceededReceiveMaximum => "Receive Maximum exceeded",
            TopicAliasInvalid => "Topic Alias invalid",
            PacketTooLarge => "Packet too large",
            ExceedMessageRate => "Message rate too high",
            QuotaExceeded => "Quota exceeded",
            AdminAction => "Administrative action",
            PayloadFormatInvalid => "Payload format invalid",
            RetainNotSupported => "Retain not supported",
            QoSNotSupported => "QoS not supported",
            UseAnotherServer => "Use another server",
            ServerMoved => "Server moved",
            UnsupportedSharedSubscription => "Shared Subscriptions not supported",
            ExceedConnectionRate => "Connection rate exceeded",
            ExceedMaximumConnectTime => "Maximum connect time",
            SubscriptionIdNotSupported => "Subscription Identifiers not supported",
            WildcardSubscriptionsNotSupported => "Wildcard Subscriptions not supported",
        };

        write!(f, "{}", s)
    }
}
