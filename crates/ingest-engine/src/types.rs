//! Data carriers shared across the pipeline stages

use amibridge_ami_core::RawMessage;
use chrono::{DateTime, Utc};

/// One completed dial attempt, lifted out of the manager event stream
///
/// Every field except the capture timestamp and the raw mapping is
/// optional: the manager omits fields freely and absence is data here,
/// not an error. `dialed_10` is either `None` or exactly 10 ASCII digits,
/// guaranteed by construction through the normalizer.
#[derive(Debug, Clone)]
pub struct DialCompletionEvent {
    /// Capture time (when the bridge decoded the event), UTC
    pub event_time: DateTime<Utc>,
    /// Unique identifier of the call leg
    pub uniqueid: Option<String>,
    /// Identifier grouping the legs of one logical call
    pub linkedid: Option<String>,
    /// Extension that originated the dial
    pub src_extension: Option<String>,
    /// Dialed string exactly as the manager reported it
    pub dialed_raw: Option<String>,
    /// Canonical 10-digit national number, when normalization succeeded
    pub dialed_10: Option<String>,
    /// Outcome code of the dial attempt (ANSWER, NOANSWER, BUSY, ...)
    pub disposition: Option<String>,
    /// Channel the dial ran on
    pub channel: Option<String>,
    /// Full decoded mapping, kept for audit
    pub raw: RawMessage,
}

/// A contact resolved from the directory by canonical phone number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMatch {
    pub contact_id: i64,
    pub contract_id: Option<String>,
    pub display_name: String,
}

/// The persisted, flattened form of one processed event
///
/// Append-only: rows are inserted once and never updated or deleted by
/// this process. Contact fields are null when correlation found nothing.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub event_time: DateTime<Utc>,
    pub uniqueid: Option<String>,
    pub linkedid: Option<String>,
    pub src_extension: Option<String>,
    pub dialed_raw: Option<String>,
    pub dialed_10: Option<String>,
    pub disposition: Option<String>,
    pub channel: Option<String>,
    pub contact_id: Option<i64>,
    pub contract_id: Option<String>,
    pub contact_name: Option<String>,
    /// Raw mapping, serialized to JSON text by the persister
    pub raw: RawMessage,
}

impl CallRecord {
    /// Flatten an event and its (possibly absent) contact match into a row
    pub fn new(event: DialCompletionEvent, contact: Option<ContactMatch>) -> Self {
        let (contact_id, contract_id, contact_name) = match contact {
            Some(m) => (Some(m.contact_id), m.contract_id, Some(m.display_name)),
            None => (None, None, None),
        };
        Self {
            event_time: event.event_time,
            uniqueid: event.uniqueid,
            linkedid: event.linkedid,
            src_extension: event.src_extension,
            dialed_raw: event.dialed_raw,
            dialed_10: event.dialed_10,
            disposition: event.disposition,
            channel: event.channel,
            contact_id,
            contract_id,
            contact_name,
            raw: event.raw,
        }
    }

    /// Whether correlation attached a contact to this record
    pub fn is_matched(&self) -> bool {
        self.contact_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> DialCompletionEvent {
        DialCompletionEvent {
            event_time: Utc::now(),
            uniqueid: Some("1700000000.42".into()),
            linkedid: Some("1700000000.41".into()),
            src_extension: Some("1004".into()),
            dialed_raw: Some("015512345678".into()),
            dialed_10: Some("5512345678".into()),
            disposition: Some("ANSWER".into()),
            channel: Some("SIP/1004-0001".into()),
            raw: RawMessage::parse("Event: DialEnd"),
        }
    }

    #[test]
    fn matched_record_carries_contact_fields() {
        let record = CallRecord::new(
            sample_event(),
            Some(ContactMatch {
                contact_id: 7,
                contract_id: Some("CT-0099".into()),
                display_name: "Ana Reyes".into(),
            }),
        );
        assert!(record.is_matched());
        assert_eq!(record.contact_id, Some(7));
        assert_eq!(record.contract_id.as_deref(), Some("CT-0099"));
        assert_eq!(record.contact_name.as_deref(), Some("Ana Reyes"));
    }

    #[test]
    fn unmatched_record_has_null_contact_fields() {
        let record = CallRecord::new(sample_event(), None);
        assert!(!record.is_matched());
        assert_eq!(record.contact_id, None);
        assert_eq!(record.contract_id, None);
        assert_eq!(record.contact_name, None);
        assert_eq!(record.dialed_10.as_deref(), Some("5512345678"));
    }
}
