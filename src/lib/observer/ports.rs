use super::types::{ObserverWarning, WarningSink};
use std::collections::HashMap;

/// Returns the port from the first candidate label that holds a valid port
/// number. Labels that don't parse or fall outside `0..=65535` are reported
/// to `sink` and skipped. A value of `0` matches but means no port.
pub fn port_from_labels(
    labels: &HashMap<String, String>,
    candidates: &[String],
    sink: &dyn WarningSink,
) -> Option<u16> {
    for label in candidates {
        let Some(value) = labels.get(label) else {
            continue;
        };

        let parsed = match value.parse::<i64>() {
            Ok(parsed) => parsed,
            Err(err) => {
                sink.warn(ObserverWarning::PortLabelUnparsable {
                    label: label.clone(),
                    value: value.clone(),
                    error: err.to_string(),
                });
                continue;
            }
        };

        match u16::try_from(parsed) {
            Ok(0) => return None,
            Ok(port) => return Some(port),
            Err(_) => {
                sink.warn(ObserverWarning::PortLabelOutOfRange {
                    label: label.clone(),
                    value: parsed,
                });
            }
        }
    }

    None
}
