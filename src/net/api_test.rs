use super::*;

#[test]
fn user_endpoints_format_expected_paths() {
    assert_eq!(user_profile_endpoint("alice"), "/users/alice");
    assert_eq!(user_rooms_endpoint("alice"), "/rooms/user/alice");
}

#[test]
fn message_endpoints_format_expected_paths() {
    assert_eq!(private_history_endpoint("alice"), "/messages/private/alice");
    assert_eq!(unread_endpoint("alice"), "/messages/unread/alice");
    assert_eq!(mark_read_endpoint("6650aa"), "/messages/mark-read/6650aa");
}

#[test]
fn room_endpoints_format_expected_paths() {
    assert_eq!(join_room_endpoint("r1"), "/rooms/r1/join");
    assert_eq!(leave_room_endpoint("r1"), "/rooms/r1/leave");
    assert_eq!(room_messages_endpoint("r1"), "/rooms/r1/messages");
    assert_eq!(create_invite_endpoint("r1"), "/rooms/r1/invite");
    assert_eq!(list_invites_endpoint("r1"), "/rooms/r1/invites");
    assert_eq!(disable_invite_endpoint("r1", "abc"), "/rooms/r1/invites/abc/disable");
}

#[test]
fn encode_segment_escapes_reserved_bytes() {
    assert_eq!(encode_segment("a b/c"), "a%20b%2Fc");
    assert_eq!(encode_segment("ok-name_1.~"), "ok-name_1.~");
    assert_eq!(encode_segment("ă"), "%C4%83");
}

#[test]
fn encode_segment_blocks_path_traversal() {
    assert_eq!(user_profile_endpoint("../auth"), "/users/..%2Fauth");
}
