use amuseing::library::Library;
use amuseing::m3u;
use amuseing::playlist::Playlist;
use amuseing::radio::{self, RadioStation};

#[test]
fn playlist_shuffle_restores_original_order_when_disabled() {
    let mut unshuffled = Playlist::new();
    unshuffled.add("a.mp3");
    let current = unshuffled.add("b.mp3");
    unshuffled.add("c.mp3");

    let mut active = Playlist::new();
    active.shuffle_from(&unshuffled, current, 7);
    assert_eq!(active.count(), unshuffled.count());

    let restored = unshuffled.deep_copy();
    let original: Vec<_> = unshuffled.iter().map(|s| s.id).collect();
    let restored_order: Vec<_> = restored.iter().map(|s| s.id).collect();
    assert_eq!(original, restored_order);
}

#[test]
fn library_tsv_round_trip_preserves_tree_shape() {
    let mut lib = Library::new();
    let root = lib.insert("music", true, None);
    let artist = lib.insert("artist", true, Some(root));
    let song = lib.insert("song.mp3", false, Some(artist));
    lib.set_enqueued(song, true);

    let tsv = lib.serialize_tsv();
    let reloaded = Library::deserialize_tsv(&tsv).unwrap();

    assert_eq!(reloaded.full_path(song), "music/artist/song.mp3");
    assert_eq!(reloaded.roots(), &[root]);
}

#[test]
fn m3u_favorites_round_trip_through_a_file_on_disk() {
    let dir = std::env::temp_dir().join(format!(
        "amuseing-integration-test-{:?}",
        std::thread::current().id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();

    let data = "#EXTM3U\n#EXTINF:200,Track One\nsongs/one.mp3\n#EXTINF:180,Track Two\nsongs/two.mp3\n";
    let favorites_path = dir.join("favorites.m3u");
    std::fs::write(&favorites_path, data).unwrap();

    let read_back = std::fs::read_to_string(&favorites_path).unwrap();
    let entries = m3u::parse(&read_back, &dir);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].path, dir.join("songs/one.mp3"));
    assert_eq!(entries[1].title.as_deref(), Some("Track Two"));

    let rewritten = m3u::write(&entries);
    let reparsed = m3u::parse(&rewritten, &dir);
    assert_eq!(entries, reparsed);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn radio_favorites_round_trip_with_delimiter_collision() {
    let stations = vec![
        RadioStation {
            name: "Station A".into(),
            url_resolved: "https://a.example.invalid".into(),
            country: "Testland".into(),
            codec: "MP3".into(),
            bitrate: "128".into(),
            votes: "10".into(),
        },
        RadioStation {
            name: "Weird:::Name".into(),
            url_resolved: "https://b.example.invalid".into(),
            country: "Otherland".into(),
            codec: "AAC".into(),
            bitrate: "256".into(),
            votes: "3".into(),
        },
    ];

    let text = radio::write(&stations);
    let parsed = radio::parse(&text);
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0], stations[0]);
    assert!(!parsed[1].name.contains(":::"));
}
