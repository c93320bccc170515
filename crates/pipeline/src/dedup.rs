//! The deduplication stage.
//!
//! Streams are grouped by a composite key built from the configured key
//! parts; each group is partitioned into acquisition classes (cached,
//! uncached, p2p) with an independent keep policy per class, then the
//! cross-class `multiGroupBehaviour` decides whether uncached copies
//! survive next to cached ones. Runs after sorting, so "best" within a
//! class means "earliest in the current order".

use std::collections::{HashMap, HashSet};

use model::{DedupKey, DedupMode, DeduplicatorConfig, MultiGroupBehaviour, ParsedStream, StreamType};

pub fn deduplicate(streams: Vec<ParsedStream>, config: &DeduplicatorConfig) -> Vec<ParsedStream> {
    if !config.enabled || config.keys.is_empty() {
        return streams;
    }

    // Group positions by composite key; keyless streams are exempt.
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (position, stream) in streams.iter().enumerate() {
        if let Some(key) = composite_key(stream, &config.keys) {
            groups.entry(key).or_default().push(position);
        }
    }

    let mut dropped: HashSet<usize> = HashSet::new();
    for positions in groups.values() {
        if positions.len() > 1 {
            dedup_group(&streams, positions, config, &mut dropped);
        }
    }

    if !dropped.is_empty() {
        tracing::debug!("deduplicator: dropped {} duplicate stream(s)", dropped.len());
    }

    streams
        .into_iter()
        .enumerate()
        .filter_map(|(position, stream)| (!dropped.contains(&position)).then_some(stream))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AcquisitionClass {
    Cached,
    Uncached,
    P2p,
    /// HTTP/live/other streams are never deduplicated against each other.
    Other,
}

fn classify(stream: &ParsedStream) -> AcquisitionClass {
    if stream.is_cached() {
        AcquisitionClass::Cached
    } else if stream.service.is_some() {
        AcquisitionClass::Uncached
    } else if stream.stream_type == StreamType::P2p {
        AcquisitionClass::P2p
    } else {
        AcquisitionClass::Other
    }
}

fn dedup_group(
    streams: &[ParsedStream],
    positions: &[usize],
    config: &DeduplicatorConfig,
    dropped: &mut HashSet<usize>,
) {
    let class_of = |position: usize| classify(&streams[position]);

    apply_mode(
        streams,
        positions,
        config.cached,
        AcquisitionClass::Cached,
        &class_of,
        dropped,
    );
    apply_mode(
        streams,
        positions,
        config.uncached,
        AcquisitionClass::Uncached,
        &class_of,
        dropped,
    );
    apply_mode(
        streams,
        positions,
        config.p2p,
        AcquisitionClass::P2p,
        &class_of,
        dropped,
    );

    // Cross-class policy: how uncached copies coexist with cached ones.
    let cached_survivors: Vec<usize> = positions
        .iter()
        .copied()
        .filter(|&p| class_of(p) == AcquisitionClass::Cached && !dropped.contains(&p))
        .collect();
    if cached_survivors.is_empty() {
        return;
    }

    match config.multi_group_behaviour {
        MultiGroupBehaviour::KeepAll => {}
        MultiGroupBehaviour::Aggressive => {
            for &position in positions {
                if class_of(position) == AcquisitionClass::Uncached {
                    dropped.insert(position);
                }
            }
        }
        MultiGroupBehaviour::Conservative => {
            let cached_services: HashSet<&str> = cached_survivors
                .iter()
                .filter_map(|&p| streams[p].service.as_ref())
                .map(|s| s.id.as_str())
                .collect();
            for &position in positions {
                if class_of(position) != AcquisitionClass::Uncached {
                    continue;
                }
                let same_service = streams[position]
                    .service
                    .as_ref()
                    .map(|s| cached_services.contains(s.id.as_str()))
                    .unwrap_or(false);
                if same_service {
                    dropped.insert(position);
                }
            }
        }
    }
}

/// Apply one class's keep policy inside a group.
fn apply_mode(
    streams: &[ParsedStream],
    positions: &[usize],
    mode: DedupMode,
    class: AcquisitionClass,
    class_of: &impl Fn(usize) -> AcquisitionClass,
    dropped: &mut HashSet<usize>,
) {
    if mode == DedupMode::Disabled {
        return;
    }
    let members: Vec<usize> = positions
        .iter()
        .copied()
        .filter(|&p| class_of(p) == class)
        .collect();
    if members.len() <= 1 {
        return;
    }

    match mode {
        DedupMode::SingleResult => {
            // Keep the best (first in current order).
            for &position in &members[1..] {
                dropped.insert(position);
            }
        }
        DedupMode::PerService => {
            let mut seen_services: HashSet<String> = HashSet::new();
            for &position in &members {
                let service = streams[position]
                    .service
                    .as_ref()
                    .map(|s| s.id.clone())
                    .unwrap_or_default();
                if !seen_services.insert(service) {
                    dropped.insert(position);
                }
            }
        }
        DedupMode::Disabled => unreachable!(),
    }
}

/// Composite key from the configured parts; `None` exempts the stream.
fn composite_key(stream: &ParsedStream, keys: &[DedupKey]) -> Option<String> {
    let mut parts: Vec<String> = Vec::with_capacity(keys.len());
    for key in keys {
        let part = match key {
            DedupKey::Filename => stream.filename.as_deref().map(normalize_filename),
            DedupKey::InfoHash => stream.info_hash(),
            DedupKey::Size => stream.size.map(|s| s.to_string()),
            DedupKey::SmartDetect => smart_key(stream),
        };
        if let Some(part) = part {
            parts.push(part);
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("|"))
    }
}

/// Info-hash when present, else normalized filename plus size.
fn smart_key(stream: &ParsedStream) -> Option<String> {
    if let Some(hash) = stream.info_hash() {
        return Some(hash);
    }
    let filename = stream.filename.as_deref().map(normalize_filename)?;
    match stream.size {
        Some(size) => Some(format!("{filename}:{size}")),
        None => Some(filename),
    }
}

fn normalize_filename(filename: &str) -> String {
    filename
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::ServiceInfo;
    use serde_json::json;

    fn stream(id: &str, hash: &str, service: Option<(&str, bool)>) -> ParsedStream {
        let mut stream: ParsedStream =
            serde_json::from_value(json!({"id": id, "type": "debrid"})).unwrap();
        stream.torrent = Some(model::TorrentInfo {
            info_hash: Some(hash.to_string()),
            seeders: None,
        });
        match service {
            Some((service_id, cached)) => {
                stream.service = Some(ServiceInfo {
                    id: service_id.into(),
                    short_name: None,
                    cached,
                });
            }
            None => {
                stream.stream_type = StreamType::P2p;
            }
        }
        stream
    }

    fn config(keys: Vec<DedupKey>) -> DeduplicatorConfig {
        DeduplicatorConfig {
            enabled: true,
            keys,
            multi_group_behaviour: MultiGroupBehaviour::KeepAll,
            cached: DedupMode::SingleResult,
            uncached: DedupMode::SingleResult,
            p2p: DedupMode::SingleResult,
        }
    }

    fn ids(streams: &[ParsedStream]) -> Vec<&str> {
        streams.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn disabled_deduplicator_keeps_everything() {
        let streams = vec![
            stream("a", "aaaa", Some(("rd", true))),
            stream("b", "aaaa", Some(("rd", true))),
        ];
        let mut cfg = config(vec![DedupKey::InfoHash]);
        cfg.enabled = false;
        assert_eq!(deduplicate(streams, &cfg).len(), 2);
    }

    #[test]
    fn single_result_keeps_first_per_class() {
        let streams = vec![
            stream("rd-cached", "aaaa", Some(("rd", true))),
            stream("ad-cached", "aaaa", Some(("ad", true))),
            stream("p2p-1", "aaaa", None),
            stream("p2p-2", "aaaa", None),
            stream("other-hash", "bbbb", Some(("rd", true))),
        ];
        let kept = deduplicate(streams, &config(vec![DedupKey::InfoHash]));
        assert_eq!(ids(&kept), vec!["rd-cached", "p2p-1", "other-hash"]);
    }

    #[test]
    fn per_service_keeps_best_per_service() {
        let streams = vec![
            stream("rd-1", "aaaa", Some(("rd", true))),
            stream("rd-2", "aaaa", Some(("rd", true))),
            stream("ad-1", "aaaa", Some(("ad", true))),
        ];
        let mut cfg = config(vec![DedupKey::InfoHash]);
        cfg.cached = DedupMode::PerService;
        let kept = deduplicate(streams, &cfg);
        assert_eq!(ids(&kept), vec!["rd-1", "ad-1"]);
    }

    #[test]
    fn aggressive_drops_all_uncached_next_to_cached() {
        let streams = vec![
            stream("cached", "aaaa", Some(("rd", true))),
            stream("uncached-rd", "aaaa", Some(("rd", false))),
            stream("uncached-ad", "aaaa", Some(("ad", false))),
        ];
        let mut cfg = config(vec![DedupKey::InfoHash]);
        cfg.multi_group_behaviour = MultiGroupBehaviour::Aggressive;
        let kept = deduplicate(streams, &cfg);
        assert_eq!(ids(&kept), vec!["cached"]);
    }

    #[test]
    fn conservative_drops_only_same_service_uncached() {
        // Cached on X, uncached on X, uncached on Y.
        let streams = vec![
            stream("cached-x", "aaaa", Some(("service-x", true))),
            stream("uncached-x", "aaaa", Some(("service-x", false))),
            stream("uncached-y", "aaaa", Some(("service-y", false))),
        ];
        let mut cfg = config(vec![DedupKey::InfoHash]);
        cfg.multi_group_behaviour = MultiGroupBehaviour::Conservative;
        // Each class on its own keeps the single cached and the best
        // uncached per service.
        cfg.uncached = DedupMode::PerService;
        let kept = deduplicate(streams, &cfg);
        assert_eq!(ids(&kept), vec!["cached-x", "uncached-y"]);
    }

    #[test]
    fn keep_all_leaves_classes_alone() {
        let streams = vec![
            stream("cached", "aaaa", Some(("rd", true))),
            stream("uncached", "aaaa", Some(("rd", false))),
        ];
        let cfg = config(vec![DedupKey::InfoHash]);
        let kept = deduplicate(streams, &cfg);
        assert_eq!(ids(&kept), vec!["cached", "uncached"]);
    }

    #[test]
    fn smart_detect_falls_back_to_filename_and_size() {
        let mut a: ParsedStream =
            serde_json::from_value(json!({"id": "a", "type": "debrid"})).unwrap();
        a.filename = Some("Show.S01E01.1080p.mkv".into());
        a.size = Some(1000);
        a.service = Some(ServiceInfo {
            id: "rd".into(),
            short_name: None,
            cached: true,
        });
        let mut b = a.clone();
        b.id = "b".into();
        // Same release, different punctuation.
        b.filename = Some("show s01e01 1080p mkv".into());
        let mut c = a.clone();
        c.id = "c".into();
        c.size = Some(2000);

        let kept = deduplicate(vec![a, b, c], &config(vec![DedupKey::SmartDetect]));
        assert_eq!(ids(&kept), vec!["a", "c"]);
    }

    #[test]
    fn streams_without_key_material_are_exempt() {
        let mut bare: ParsedStream =
            serde_json::from_value(json!({"id": "bare", "type": "debrid"})).unwrap();
        bare.service = Some(ServiceInfo {
            id: "rd".into(),
            short_name: None,
            cached: true,
        });
        let twin = {
            let mut twin = bare.clone();
            twin.id = "twin".into();
            twin
        };
        let kept = deduplicate(vec![bare, twin], &config(vec![DedupKey::InfoHash]));
        assert_eq!(kept.len(), 2);
    }
}
