//! Extraction of dial-completion events from the decoded message stream
//!
//! The manager emits dozens of event types; this stage is an explicit
//! allow-list, not a deny-list. Solicited replies and every event type
//! outside the list are dropped without side effects.

use amibridge_ami_core::RawMessage;
use chrono::Utc;

use crate::phone::normalize_mx_phone10;
use crate::types::DialCompletionEvent;

/// Event types that represent a concluded dial attempt
pub const ACCEPTED_EVENTS: [&str; 1] = ["DialEnd"];

/// Candidate fields for the dialed number, in precedence order
pub const DIALED_NUMBER_KEYS: [&str; 3] = ["DestCallerIDNum", "DialString", "Exten"];

/// Candidate fields for the originating extension, in precedence order
pub const SRC_EXTENSION_KEYS: [&str; 2] = ["CallerIDNum", "CallerID"];

/// Lift a dial-completion event out of one decoded message
///
/// Returns `None` for solicited replies and for every event type not in
/// [`ACCEPTED_EVENTS`]. Absent fields stay `None` on the event; absence is
/// never an error. The full mapping moves into the event for audit.
pub fn extract_dial_completion(msg: RawMessage) -> Option<DialCompletionEvent> {
    if msg.is_response() {
        return None;
    }
    let event = msg.event()?;
    if !ACCEPTED_EVENTS.contains(&event) {
        return None;
    }

    let dialed_raw = msg.first_of(&DIALED_NUMBER_KEYS).map(str::to_string);
    let dialed_10 = dialed_raw.as_deref().and_then(normalize_mx_phone10);
    let src_extension = msg.first_of(&SRC_EXTENSION_KEYS).map(str::to_string);

    Some(DialCompletionEvent {
        event_time: Utc::now(),
        uniqueid: field(&msg, "Uniqueid"),
        linkedid: field(&msg, "Linkedid"),
        src_extension,
        dialed_raw,
        dialed_10,
        disposition: field(&msg, "DialStatus"),
        channel: field(&msg, "Channel"),
        raw: msg,
    })
}

fn field(msg: &RawMessage, key: &str) -> Option<String> {
    msg.get(key).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(block: &str) -> RawMessage {
        RawMessage::parse(block)
    }

    #[test]
    fn dial_end_is_accepted_and_normalized() {
        let event = extract_dial_completion(parse(
            "Event: DialEnd\r\nDestCallerIDNum: 5215512345678\r\nCallerIDNum: 1004\r\n\
             DialStatus: ANSWER\r\nChannel: SIP/1004-0001\r\n\
             Uniqueid: 1700000000.42\r\nLinkedid: 1700000000.41",
        ))
        .unwrap();
        assert_eq!(event.dialed_raw.as_deref(), Some("5215512345678"));
        assert_eq!(event.dialed_10.as_deref(), Some("5512345678"));
        assert_eq!(event.src_extension.as_deref(), Some("1004"));
        assert_eq!(event.disposition.as_deref(), Some("ANSWER"));
        assert_eq!(event.channel.as_deref(), Some("SIP/1004-0001"));
        assert_eq!(event.uniqueid.as_deref(), Some("1700000000.42"));
        assert_eq!(event.linkedid.as_deref(), Some("1700000000.41"));
    }

    #[test]
    fn other_event_types_are_discarded() {
        assert!(extract_dial_completion(parse("Event: Hangup\r\nChannel: X")).is_none());
        assert!(extract_dial_completion(parse("Event: Newchannel")).is_none());
        assert!(extract_dial_completion(parse("Event: DialBegin")).is_none());
    }

    #[test]
    fn responses_are_discarded() {
        assert!(extract_dial_completion(parse("Response: Success\r\nMessage: ok")).is_none());
    }

    #[test]
    fn eventless_message_is_discarded() {
        assert!(extract_dial_completion(parse("Channel: SIP/1004-0001")).is_none());
    }

    #[test]
    fn dialed_number_precedence_skips_empty_candidates() {
        let event = extract_dial_completion(parse(
            "Event: DialEnd\r\nDestCallerIDNum:\r\nDialString: 5512345678\r\nExten: 100",
        ))
        .unwrap();
        assert_eq!(event.dialed_raw.as_deref(), Some("5512345678"));
    }

    #[test]
    fn extension_falls_back_to_caller_id_display() {
        let event =
            extract_dial_completion(parse("Event: DialEnd\r\nCallerID: \"Ana\" <1004>")).unwrap();
        assert_eq!(event.src_extension.as_deref(), Some("\"Ana\" <1004>"));
    }

    #[test]
    fn absent_fields_stay_none() {
        let event = extract_dial_completion(parse("Event: DialEnd")).unwrap();
        assert_eq!(event.uniqueid, None);
        assert_eq!(event.linkedid, None);
        assert_eq!(event.src_extension, None);
        assert_eq!(event.dialed_raw, None);
        assert_eq!(event.dialed_10, None);
        assert_eq!(event.disposition, None);
        assert_eq!(event.channel, None);
    }

    #[test]
    fn unnormalizable_dialed_string_is_kept_raw() {
        let event =
            extract_dial_completion(parse("Event: DialEnd\r\nDestCallerIDNum: 911")).unwrap();
        assert_eq!(event.dialed_raw.as_deref(), Some("911"));
        assert_eq!(event.dialed_10, None);
    }

    #[test]
    fn raw_mapping_travels_with_the_event() {
        let event = extract_dial_completion(parse(
            "Event: DialEnd\r\nDestCallerIDNum: 5512345678\r\nForwarded: no",
        ))
        .unwrap();
        assert_eq!(event.raw.get("Forwarded"), Some("no"));
        assert_eq!(event.raw.len(), 3);
    }
}
