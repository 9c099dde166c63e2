use rand::Rng;

pub mod ticket_status {
    pub const OPEN: &str = "open";
    pub const ANSWERED: &str = "answered";
    pub const CLOSED: &str = "closed";
}

/// Status after a new message lands. A staff reply marks the ticket
/// answered; any user reply puts it back in the open queue, including on a
/// closed ticket — replying reopens it.
pub fn status_after_reply(author_is_staff: bool) -> &'static str {
    if author_is_staff {
        ticket_status::ANSWERED
    } else {
        ticket_status::OPEN
    }
}

const REFERENCE_LEN: usize = 8;
const REFERENCE_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Short human-readable ticket reference, e.g. "K7Q2MZ4D". The charset
/// drops 0/O/1/I to keep it unambiguous over the phone.
pub fn generate_reference() -> String {
    let mut rng = rand::thread_rng();
    (0..REFERENCE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..REFERENCE_CHARSET.len());
            REFERENCE_CHARSET[idx] as char
        })
        .collect()
}

/// First ~200 characters of a message, for notification previews.
pub fn body_preview(body: &str) -> String {
    let mut preview: String = body.chars().take(200).collect();
    if body.chars().count() > 200 {
        preview.push('…');
    }
    preview
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_reply_reopens() {
        // auto-reopen: the current status does not matter for a user reply
        assert_eq!(status_after_reply(false), ticket_status::OPEN);
    }

    #[test]
    fn staff_reply_marks_answered() {
        assert_eq!(status_after_reply(true), ticket_status::ANSWERED);
    }

    #[test]
    fn reference_shape() {
        let reference = generate_reference();
        assert_eq!(reference.len(), 8);
        assert!(reference.bytes().all(|b| REFERENCE_CHARSET.contains(&b)));
    }

    #[test]
    fn preview_truncates_long_bodies() {
        let long = "x".repeat(500);
        let preview = body_preview(&long);
        assert_eq!(preview.chars().count(), 201);
        assert!(preview.ends_with('…'));

        assert_eq!(body_preview("short"), "short");
    }
}
