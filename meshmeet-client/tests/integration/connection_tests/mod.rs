mod test_leave_releases_everything;
mod test_media_access_denied;
mod test_toggle_local_tracks;
mod test_two_participants_connect;
mod test_webrtc_two_participants;
