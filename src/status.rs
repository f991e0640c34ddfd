use chrono::{DateTime, Utc};
use libwifi::frame::components::MacAddress;
use std::fmt;
use std::time::Duration;

/// Observable protocol events of one MAC entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MacEvent {
    /// The station entered the associated state with this BSSID.
    Associated(MacAddress),
    /// The station left the associated state.
    Deassociated(MacAddress),
    LinkUp,
    LinkDown,
    RxDrop(String),
    TxDrop(String),
    /// An access point confirmed the association of a peer.
    PeerAssociated(MacAddress),
    PeerDisassociated(MacAddress),
}

impl fmt::Display for MacEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacEvent::Associated(bssid) => write!(f, "Associated with {}", bssid),
            MacEvent::Deassociated(bssid) => write!(f, "Deassociated from {}", bssid),
            MacEvent::LinkUp => write!(f, "Link up"),
            MacEvent::LinkDown => write!(f, "Link down"),
            MacEvent::RxDrop(reason) => write!(f, "Rx drop ({})", reason),
            MacEvent::TxDrop(reason) => write!(f, "Tx drop ({})", reason),
            MacEvent::PeerAssociated(peer) => write!(f, "{} associated", peer),
            MacEvent::PeerDisassociated(peer) => write!(f, "{} disassociated", peer),
        }
    }
}

impl MacEvent {
    pub fn message_type(&self) -> MessageType {
        match self {
            MacEvent::Associated(_) | MacEvent::PeerAssociated(_) => MessageType::Priority,
            MacEvent::LinkUp | MacEvent::LinkDown => MessageType::Status,
            MacEvent::RxDrop(_) | MacEvent::TxDrop(_) => MessageType::Warning,
            MacEvent::Deassociated(_) | MacEvent::PeerDisassociated(_) => MessageType::Info,
        }
    }
}

/// Receives the events a MAC entity raises.
pub trait MacListener {
    fn notify(&mut self, event: MacEvent);
}

impl MacListener for Vec<MacEvent> {
    fn notify(&mut self, event: MacEvent) {
        self.push(event);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageType {
    Warning,
    Info,
    Priority,
    Status,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message_type_str = match self {
            MessageType::Warning => "Warning",
            MessageType::Info => "Info",
            MessageType::Priority => "Priority",
            MessageType::Status => "Status",
        };
        write!(f, "{}", message_type_str)
    }
}

#[derive(Clone, Debug)]
pub struct StatusMessage {
    pub timestamp: DateTime<Utc>,
    /// Simulation time, when the message comes out of a simulation run.
    pub virtual_time: Option<Duration>,
    pub message_type: MessageType,
    pub content: String,
}

impl StatusMessage {
    pub fn new(message_type: MessageType, content: String) -> Self {
        StatusMessage {
            timestamp: Utc::now(),
            virtual_time: None,
            message_type,
            content,
        }
    }

    pub fn at(virtual_time: Duration, message_type: MessageType, content: String) -> Self {
        StatusMessage {
            virtual_time: Some(virtual_time),
            ..StatusMessage::new(message_type, content)
        }
    }
}

pub struct MessageLog {
    messages: Vec<StatusMessage>,
    headless: bool,
    max_size: usize,
}

impl MessageLog {
    pub fn new(headless: bool, max_size: Option<usize>) -> Self {
        MessageLog {
            messages: Vec::new(),
            headless,
            max_size: max_size.unwrap_or(500),
        }
    }

    pub fn add_message(&mut self, message: StatusMessage) {
        if self.max_size == 0 {
            return;
        }
        if self.messages.len() == self.max_size {
            self.messages.remove(0);
        }

        if self.headless {
            let color = match message.message_type {
                MessageType::Warning => "\x1b[33m",
                MessageType::Info => "\x1b[0m",
                MessageType::Priority => "\x1b[32m",
                MessageType::Status => "\x1b[36m",
            };
            let white = "\x1b[0m";
            let virtual_time = match message.virtual_time {
                Some(time) => format!("{:>12.6}s", time.as_secs_f64()),
                None => format!("{:>13}", "-"),
            };
            println!(
                "{}{} | {} | {:^8} | {}{}",
                color,
                message.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
                virtual_time,
                message.message_type,
                message.content,
                white,
            )
        }

        self.messages.push(message);
    }

    /// Log an event raised by the MAC entity with the given address.
    pub fn record(&mut self, virtual_time: Duration, address: &MacAddress, event: &MacEvent) {
        self.add_message(StatusMessage::at(
            virtual_time,
            event.message_type(),
            format!("{} {}", address, event),
        ));
    }

    pub fn get_all_messages(&self) -> Vec<StatusMessage> {
        self.messages.clone()
    }

    pub fn size(&self) -> usize {
        self.messages.len()
    }
}

impl MacListener for MessageLog {
    fn notify(&mut self, event: MacEvent) {
        self.add_message(StatusMessage::new(event.message_type(), event.to_string()));
    }
}
