//! Topic generation for channel command and state topics

use heapless::String;

use super::dto::TopicKind;
use crate::config::MAX_TOPIC_LEN;

pub type Topic = String<MAX_TOPIC_LEN>;

/// Generate a channel topic
///
/// Format: `{room}/{type}/com` or `{room}/{type}/state`
pub fn topic_for(room: &str, device_type: &str, kind: TopicKind) -> Topic {
    let mut topic = Topic::new();
    let _ = topic.push_str(room);
    let _ = topic.push('/');
    let _ = topic.push_str(device_type);
    let _ = topic.push('/');
    let _ = topic.push_str(kind.suffix());
    topic
}
