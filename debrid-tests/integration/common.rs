//! Shared fixtures: one torrent, scripted per provider protocol.
//!
//! Every provider fixture describes the same torrent so that the canonical
//! file list is identical across adapters.

use std::sync::Arc;

use debrid_core::test_mocks::MockHttpClient;
use debrid_core::{DebridConfig, DebridStrategy, Provider, create_adapter_with_client};
use serde_json::{Map, Value, json};

pub const HASH: &str = "34ff1fae9661d72152fb1fc31e27c15297072654";

/// Canonical paths every adapter reports for the fixture torrent.
pub const PATHS: [&str; 2] = ["movie.mkv", "Subs/en.srt"];

pub fn magnet() -> String {
    format!(
        "magnet:?xt=urn:btih:{}&dn=Movie&tr=udp%3A%2F%2Ftracker.example%3A80",
        HASH.to_uppercase()
    )
}

/// Fresh adapter over `mock` with a token already set.
pub fn adapter(provider: Provider, mock: &Arc<MockHttpClient>) -> Box<dyn DebridStrategy> {
    let adapter = create_adapter_with_client(provider, mock.clone(), &DebridConfig::for_testing())
        .expect("adapter");
    adapter.set_token("integration-token").expect("token");
    adapter
}

pub fn download_url(path: &str) -> String {
    format!("https://cdn.example/{path}")
}

/// Queues the responses `cached_files` consumes on a fresh adapter.
pub fn script_cached_files(provider: Provider, mock: &MockHttpClient) {
    match provider {
        Provider::RealDebrid => {
            mock.push_json(200, rd_listing());
            mock.push_json(200, rd_info());
        }
        Provider::AllDebrid => {
            mock.push_json(200, ad_listing());
            mock.push_json(200, ad_status());
        }
        Provider::Premiumize => {
            mock.push_json(200, json!({"status": "success", "response": [true]}));
            mock.push_json(200, pm_directdl());
        }
        Provider::TorBox => {
            mock.push_json(200, tb_checkcached());
        }
        Provider::DebridLink => {
            mock.push_json(200, dl_cached());
        }
    }
}

/// Queues the responses `download_link(path)` consumes on a fresh adapter.
pub fn script_download_link(provider: Provider, mock: &MockHttpClient, path: &str) {
    match provider {
        Provider::RealDebrid => {
            mock.push_json(200, rd_listing());
            mock.push_json(200, rd_info());
            mock.push_json(200, json!({"download": download_url(path)}));
        }
        Provider::AllDebrid => {
            mock.push_json(200, ad_listing());
            mock.push_json(200, ad_status());
            mock.push_json(
                200,
                json!({"status": "success", "data": {"link": download_url(path)}}),
            );
        }
        Provider::Premiumize => {
            mock.push_json(200, json!({"status": "success", "response": [true]}));
            mock.push_json(200, pm_directdl());
        }
        Provider::TorBox => {
            mock.push_json(200, tb_checkcached());
            mock.push_json(200, json!({"success": true, "data": [{"id": 77, "hash": HASH}]}));
            mock.push_json(200, tb_details());
            mock.push_json(200, json!({"success": true, "data": download_url(path)}));
        }
        Provider::DebridLink => {
            mock.push_json(200, dl_cached());
            mock.push_json(200, dl_seedbox());
            mock.push_json(200, dl_seedbox());
        }
    }
}

/// Like [`script_download_link`], but the provider-side record that carries
/// links has none for the listed files.
pub fn script_download_link_without_links(provider: Provider, mock: &MockHttpClient) {
    match provider {
        Provider::RealDebrid => {
            let mut info = rd_info();
            info["links"] = json!([]);
            mock.push_json(200, rd_listing());
            mock.push_json(200, info);
        }
        Provider::AllDebrid => {
            let mut status = ad_status();
            status["data"]["magnets"]["files"] = json!([{"n": "Movie", "e": [
                {"n": "movie.mkv", "s": 1572864},
                {"n": "Subs", "e": [{"n": "en.srt", "s": 2048}]}
            ]}]);
            mock.push_json(200, ad_listing());
            mock.push_json(200, status);
        }
        Provider::Premiumize => {
            mock.push_json(200, json!({"status": "success", "response": [true]}));
            mock.push_json(200, json!({"status": "success", "content": [
                {"path": "Movie/movie.mkv", "size": 1572864},
                {"path": "Movie/Subs/en.srt", "size": 2048}
            ]}));
        }
        Provider::TorBox => {
            let mut details = tb_details();
            details["data"]["files"] = json!([
                {"name": "Movie/movie.mkv", "size": 1572864},
                {"name": "Movie/Subs/en.srt", "size": 2048}
            ]);
            mock.push_json(200, tb_checkcached());
            mock.push_json(200, json!({"success": true, "data": [{"id": 77, "hash": HASH}]}));
            mock.push_json(200, details);
        }
        Provider::DebridLink => {
            let mut seedbox = dl_seedbox();
            seedbox["value"][0]["files"] = json!([]);
            mock.push_json(200, dl_cached());
            mock.push_json(200, dl_seedbox());
            mock.push_json(200, seedbox);
        }
    }
}

/// Queues the responses of two consecutive `add_magnet` calls: the first
/// registers the magnet, the second finds the existing record.
pub fn script_registration(provider: Provider, mock: &MockHttpClient) -> &'static str {
    match provider {
        Provider::RealDebrid => {
            mock.push_json(200, json!([]));
            mock.push_json(201, json!({"id": "RDNEW"}));
            mock.push_raw(204, "");
            mock.push_json(200, json!([{"id": "RDNEW", "hash": HASH, "status": "queued"}]));
            "RDNEW"
        }
        Provider::AllDebrid => {
            mock.push_json(200, json!({"status": "success", "data": {"magnets": []}}));
            mock.push_json(
                200,
                json!({"status": "success", "data": {"magnets": [{"id": 555, "hash": HASH}]}}),
            );
            mock.push_json(
                200,
                json!({"status": "success", "data": {"magnets": [{"id": 555, "hash": HASH, "statusCode": 1}]}}),
            );
            "555"
        }
        Provider::Premiumize => {
            mock.push_json(200, json!({"status": "success", "transfers": []}));
            mock.push_json(200, json!({"status": "success", "id": "pm-tr-1"}));
            mock.push_json(
                200,
                json!({"status": "success", "transfers": [{"id": "pm-tr-1", "src": magnet()}]}),
            );
            "pm-tr-1"
        }
        Provider::TorBox => {
            mock.push_json(200, json!({"success": true, "data": []}));
            mock.push_json(200, json!({"success": true, "data": {"torrent_id": 88}}));
            mock.push_json(200, json!({"success": true, "data": [{"id": 88, "hash": HASH}]}));
            "88"
        }
        Provider::DebridLink => {
            mock.push_json(200, json!({"success": true, "value": []}));
            mock.push_json(200, json!({"success": true, "value": {"id": "dl-9", "hashString": HASH}}));
            mock.push_json(
                200,
                json!({"success": true, "value": [{"id": "dl-9", "hashString": HASH}]}),
            );
            "dl-9"
        }
    }
}

fn rd_listing() -> Value {
    json!([{"id": "RDID", "filename": "Movie", "hash": HASH, "bytes": 1574912, "status": "downloaded"}])
}

fn rd_info() -> Value {
    json!({
        "id": "RDID",
        "filename": "Movie",
        "hash": HASH,
        "status": "downloaded",
        "files": [
            {"id": 1, "path": "/movie.mkv", "bytes": 1572864, "selected": 1},
            {"id": 2, "path": "/Subs/en.srt", "bytes": 2048, "selected": 1}
        ],
        "links": ["https://real-debrid.com/d/ONE", "https://real-debrid.com/d/TWO"]
    })
}

fn ad_listing() -> Value {
    json!({"status": "success", "data": {"magnets": [{"id": 101, "hash": HASH, "statusCode": 4}]}})
}

fn ad_status() -> Value {
    json!({"status": "success", "data": {"magnets": {
        "id": 101,
        "filename": "Movie",
        "hash": HASH,
        "status": "Ready",
        "statusCode": 4,
        "files": [{"n": "Movie", "e": [
            {"n": "movie.mkv", "s": 1572864, "l": "https://alldebrid.com/f/ONE"},
            {"n": "Subs", "e": [{"n": "en.srt", "s": 2048, "l": "https://alldebrid.com/f/TWO"}]}
        ]}]
    }}})
}

fn pm_directdl() -> Value {
    json!({"status": "success", "content": [
        {"path": "Movie/movie.mkv", "size": 1572864, "link": download_url("movie.mkv")},
        {"path": "Movie/Subs/en.srt", "size": 2048, "link": download_url("Subs/en.srt")}
    ]})
}

fn tb_checkcached() -> Value {
    json!({"success": true, "data": [{
        "name": "Movie",
        "hash": HASH,
        "files": [
            {"name": "Movie/movie.mkv", "size": 1572864},
            {"name": "Movie/Subs/en.srt", "size": 2048}
        ]
    }]})
}

fn tb_details() -> Value {
    json!({"success": true, "data": {
        "id": 77,
        "hash": HASH,
        "download_state": "cached",
        "download_finished": true,
        "download_present": true,
        "files": [
            {"id": 0, "name": "Movie/movie.mkv", "size": 1572864},
            {"id": 1, "name": "Movie/Subs/en.srt", "size": 2048}
        ]
    }})
}

fn dl_cached() -> Value {
    let mut value = Map::new();
    value.insert(
        HASH.to_string(),
        json!({"name": "Movie", "files": [
            {"name": "movie.mkv", "size": 1572864},
            {"name": "Subs/en.srt", "size": 2048}
        ]}),
    );
    json!({"success": true, "value": value})
}

fn dl_seedbox() -> Value {
    json!({"success": true, "value": [{
        "id": "dl-1",
        "hashString": HASH,
        "downloadPercent": 100,
        "files": [
            {"id": "dl-1-0", "name": "movie.mkv", "size": 1572864, "downloadUrl": download_url("movie.mkv")},
            {"id": "dl-1-1", "name": "Subs/en.srt", "size": 2048, "downloadUrl": download_url("Subs/en.srt")}
        ]
    }]})
}
