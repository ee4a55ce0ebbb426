use facedex::api::FacedexApi;
use facedex::config::FacedexConfig;
use facedex::model::Session;
use facedex::store::memory::InMemoryBackend;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

const THREADS: usize = 8;
const PER_THREAD: usize = 25;

fn document() -> Value {
    let mut people = Map::new();
    for t in 0..THREADS {
        for i in 0..PER_THREAD {
            people.insert(format!("t{}-{}.jpg", t, i), json!({"face_scores": [0.5]}));
        }
    }
    json!({"img": {"/data/people": people}})
}

#[test]
fn concurrent_likes_all_land_on_disk() {
    let backend = InMemoryBackend::new().with_document("faces.json", &document());
    let config = FacedexConfig {
        sources: vec![PathBuf::from("faces.json")],
        ..FacedexConfig::default()
    };
    let api = Arc::new(FacedexApi::new(backend, &config).unwrap());

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let api = Arc::clone(&api);
            thread::spawn(move || {
                let mut session = Session::default();
                for i in 0..PER_THREAD {
                    let path = format!("/data/people/t{}-{}.jpg", t, i);
                    let result = api.like(&mut session, &[path]).unwrap();
                    assert!(result.is_success());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    api.shutdown();

    assert_eq!(api.backend().write_count(), THREADS * PER_THREAD);
    let stored = api.backend().document(Path::new("faces.json")).unwrap();
    let people = stored["img"]["/data/people"].as_object().unwrap();
    assert!(people.values().all(|node| node["like"] == json!(true)));

    let mut session = Session::default();
    let index = api.load_index(&mut session);
    assert!(index.records().all(|r| r.like));
}

#[test]
fn readers_and_writers_interleave() {
    let backend = InMemoryBackend::new().with_document("faces.json", &document());
    let config = FacedexConfig {
        sources: vec![PathBuf::from("faces.json")],
        per_page: 10,
        ..FacedexConfig::default()
    };
    let api = Arc::new(FacedexApi::new(backend, &config).unwrap());

    let writer = {
        let api = Arc::clone(&api);
        thread::spawn(move || {
            let mut session = Session::default();
            for i in 0..PER_THREAD {
                let path = format!("/data/people/t0-{}.jpg", i);
                api.like(&mut session, &[path]).unwrap();
            }
        })
    };
    let reader = {
        let api = Arc::clone(&api);
        thread::spawn(move || {
            let mut session = Session::default();
            for _ in 0..PER_THREAD {
                let index = api.load_index(&mut session);
                assert_eq!(index.records().count(), THREADS * PER_THREAD);
            }
        })
    };
    writer.join().unwrap();
    reader.join().unwrap();
    api.shutdown();

    let mut session = Session::default();
    let liked = api.load_index(&mut session).records().filter(|r| r.like).count();
    assert_eq!(liked, PER_THREAD);
}

#[test]
fn contended_node_converges_on_disk_and_in_memory() {
    let backend = InMemoryBackend::new().with_document("faces.json", &document());
    let config = FacedexConfig {
        sources: vec![PathBuf::from("faces.json")],
        ..FacedexConfig::default()
    };
    let api = Arc::new(FacedexApi::new(backend, &config).unwrap());
    let target = "/data/people/t0-0.jpg";

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let api = Arc::clone(&api);
            thread::spawn(move || {
                let mut session = Session::default();
                for i in 0..PER_THREAD {
                    let result = if (t + i) % 2 == 0 {
                        api.like(&mut session, &[target])
                    } else {
                        api.unlike(&mut session, &[target])
                    };
                    assert!(result.unwrap().is_success());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    api.shutdown();

    let mut session = Session::default();
    let cached = api.document_snapshot(&mut session).unwrap();
    let stored = api.backend().document(Path::new("faces.json")).unwrap();
    assert_eq!(stored, cached);

    let like = &cached["img"]["/data/people"]["t0-0.jpg"]["like"];
    assert!(like.is_boolean());
    assert_eq!(&stored["img"]["/data/people"]["t0-0.jpg"]["like"], like);
    assert_eq!(api.backend().write_count(), THREADS * PER_THREAD);
}
