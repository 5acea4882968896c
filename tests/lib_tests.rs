use clap::Parser;
use crossbeam_channel::unbounded;
use edgeload::engine::arg_parser::{Cli, RunSettings, apply_cli_to_settings};
use edgeload::engine::handlers::resolve_settings;
use edgeload::engine::{
    EdgeBuilder, LineParser, MemStore, PostingStore, RdfParser, UidAssigner, UidEdgeBuilder,
    fingerprint64, owner_of, parse_nquad, tokenize,
};
use edgeload::pipeline::{ErrorRegister, PipelineState, read_lines};
use edgeload::utils::logger::short_target;
use edgeload::utils::{apply_file_to_settings, load_loader_toml, parse_loader_toml, setup_logging};
use edgeload::{
    EdgeError, EdgeValue, LoadError, LoadOpts, MutationOp, NQuad, ParseError, PostingKey, Shard,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::io::Cursor;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn parse_err(reason: &str) -> LoadError {
    LoadError::Parse(ParseError::new("x", 1, reason))
}

// --- parse_nquad ---

#[test]
fn test_parse_bare_words() {
    let nq = parse_nquad("a b c .").unwrap();
    assert_eq!(nq.subject, "a");
    assert_eq!(nq.predicate, "b");
    assert_eq!(nq.object_id.as_deref(), Some("c"));
    assert_eq!(nq.object_value, None);
    assert_eq!(nq.label, None);
}

#[test]
fn test_parse_iris_and_label() {
    let nq = parse_nquad("<http://x/alice> <http://x/knows> _:bob <http://x/g> .").unwrap();
    assert_eq!(nq.subject, "http://x/alice");
    assert_eq!(nq.predicate, "http://x/knows");
    assert_eq!(nq.object_id.as_deref(), Some("_:bob"));
    assert_eq!(nq.label.as_deref(), Some("http://x/g"));
}

#[test]
fn test_parse_literal_with_lang() {
    let nq = parse_nquad(r#"_:a <name> "Alice Smith"@en-GB ."#).unwrap();
    assert_eq!(nq.object_id, None);
    assert_eq!(nq.object_value.as_deref(), Some("Alice Smith"));
    assert_eq!(nq.lang.as_deref(), Some("en-GB"));
    assert_eq!(nq.datatype, None);
}

#[test]
fn test_parse_literal_with_datatype() {
    let nq = parse_nquad(r#"a age "42"^^<xs:int> ."#).unwrap();
    assert_eq!(nq.object_value.as_deref(), Some("42"));
    assert_eq!(nq.datatype.as_deref(), Some("xs:int"));
}

#[test]
fn test_parse_literal_escapes() {
    let nq = parse_nquad(r#"a note "say \"hi\"\né" ."#).unwrap();
    assert_eq!(nq.object_value.as_deref(), Some("say \"hi\"\né"));
}

#[test]
fn test_parse_trailing_comment() {
    let nq = parse_nquad("a b c . # trailing").unwrap();
    assert_eq!(nq.object_id.as_deref(), Some("c"));
}

#[test]
fn test_parse_missing_dot() {
    let err = parse_nquad("a b c").unwrap_err();
    assert!(err.reason.contains("missing '.'"), "{}", err);
}

#[test]
fn test_parse_too_few_terms() {
    assert!(parse_nquad("a b .").is_err());
}

#[test]
fn test_parse_too_many_terms() {
    assert!(parse_nquad("a b c d e .").is_err());
}

#[test]
fn test_parse_literal_subject_rejected() {
    assert!(parse_nquad(r#""a" b c ."#).is_err());
}

#[test]
fn test_parse_literal_predicate_rejected() {
    assert!(parse_nquad(r#"a "b" c ."#).is_err());
}

#[test]
fn test_parse_unterminated_literal() {
    let err = parse_nquad(r#"a b "open ."#).unwrap_err();
    assert!(err.reason.contains("unterminated literal"), "{}", err);
}

#[test]
fn test_parse_unterminated_iri() {
    assert!(parse_nquad("<a <b> c .").is_err());
}

#[test]
fn test_parse_text_after_dot() {
    assert!(parse_nquad("a b c . d").is_err());
}

#[test]
fn test_parser_trait_matches_function() {
    let line = r#"<s> <p> "v" ."#;
    assert_eq!(RdfParser.parse(line).unwrap(), parse_nquad(line).unwrap());
}

// --- sharding ---

#[test]
fn test_shard_rejects_bad_params() {
    assert!(matches!(
        Shard::new(0, 0),
        Err(LoadError::InvalidShard { .. })
    ));
    assert!(matches!(
        Shard::new(2, 2),
        Err(LoadError::InvalidShard { .. })
    ));
    assert!(Shard::new(1, 2).is_ok());
}

#[test]
fn test_single_shard_owns_everything() {
    let shard = Shard::single();
    for p in ["b", "name", "http://x/knows", ""] {
        assert!(shard.owns(p));
    }
}

#[test]
fn test_exactly_one_instance_owns_each_predicate() {
    for n in [1_u64, 2, 3, 7, 16] {
        for p in ["b", "name", "age", "http://x/knows", "friend", "ÿ"] {
            let owners: Vec<u64> = (0..n)
                .filter(|&i| Shard::new(i, n).unwrap().owns(p))
                .collect();
            assert_eq!(owners, vec![owner_of(p, n)], "predicate {p:?}, n={n}");
        }
    }
}

#[test]
fn test_owner_is_stable_across_calls_and_threads() {
    let expected = owner_of("http://x/knows", 5);
    let handles: Vec<_> = (0..4)
        .map(|_| thread::spawn(|| owner_of("http://x/knows", 5)))
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), expected);
    }
}

#[test]
fn test_fingerprint_is_xxh64_seed_zero() {
    // Every instance of a partitioned load must agree on this value.
    assert_eq!(fingerprint64(b""), 0xEF46_DB37_51D8_E999);
    assert_eq!(owner_of("", 1 << 20), 0xEF46_DB37_51D8_E999 % (1 << 20));
}

#[test]
fn test_parser_threads_never_zero() {
    let opts = LoadOpts {
        num_parsers: Some(0),
        max_routines: 0,
        ..LoadOpts::default()
    };
    assert_eq!(opts.parser_threads(), 1);
    assert_eq!(opts.mutation_threads(), 1);
    let auto = LoadOpts::default();
    assert!(auto.parser_threads() >= 1);
    assert_eq!(
        LoadOpts {
            num_parsers: Some(5),
            ..LoadOpts::default()
        }
        .parser_threads(),
        5
    );
}

// --- ErrorRegister ---

#[test]
fn test_register_starts_empty() {
    let reg = ErrorRegister::new();
    assert!(!reg.is_set());
    assert_eq!(reg.get(), None);
}

#[test]
fn test_register_first_error_wins() {
    let reg = ErrorRegister::new();
    assert!(reg.set(parse_err("first")));
    assert!(!reg.set(parse_err("second")));
    assert_eq!(reg.get(), Some(parse_err("first")));
}

#[test]
fn test_register_concurrent_set_single_winner() {
    let reg = Arc::new(ErrorRegister::new());
    let handles: Vec<_> = (0..16)
        .map(|i| {
            let reg = Arc::clone(&reg);
            thread::spawn(move || reg.set(parse_err(&format!("e{i}"))))
        })
        .collect();
    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|won| *won)
        .count();
    assert_eq!(winners, 1);
    assert!(reg.is_set());
}

// --- read_lines (randomization window) ---

fn numbered_input(n: usize) -> String {
    (0..n).map(|i| format!("line {i}\n")).collect()
}

fn run_reader(input: String, capacity: usize, seed: u64) -> (Vec<String>, u64, Arc<PipelineState>) {
    let state = PipelineState::new(Shard::single());
    let (tx, rx) = unbounded();
    let mut rng = SmallRng::seed_from_u64(seed);
    let count = read_lines(Cursor::new(input), tx, &state, capacity, &mut rng).unwrap();
    (rx.iter().collect(), count, state)
}

#[test]
fn test_window_preserves_multiset() {
    let input = numbered_input(50);
    let mut expected: Vec<String> = input.lines().map(String::from).collect();
    expected.sort();
    for capacity in [1, 2, 7, 49, 50, 51, 1000] {
        let (mut out, count, state) = run_reader(input.clone(), capacity, 7);
        assert_eq!(count, 50, "capacity {capacity}");
        assert_eq!(state.counters.read(), 50);
        out.sort();
        assert_eq!(out, expected, "capacity {capacity}");
    }
}

#[test]
fn test_window_zero_capacity_treated_as_one() {
    let (out, count, _) = run_reader(numbered_input(5), 0, 1);
    assert_eq!(count, 5);
    assert_eq!(out.len(), 5);
}

#[test]
fn test_window_reorders_long_input() {
    let input = numbered_input(1000);
    let original: Vec<String> = input.lines().map(String::from).collect();
    let (out, _, _) = run_reader(input, 10, 42);
    assert_ne!(out, original);
}

#[test]
fn test_reader_strips_crlf_and_keeps_last_line() {
    let (mut out, count, _) = run_reader("a b c .\r\n\r\nd e f .".to_string(), 1000, 3);
    out.sort();
    assert_eq!(count, 3);
    assert_eq!(out, vec!["", "a b c .", "d e f ."]);
}

#[test]
fn test_reader_empty_input() {
    let (out, count, _) = run_reader(String::new(), 1000, 3);
    assert_eq!(count, 0);
    assert!(out.is_empty());
}

#[test]
fn test_reader_long_line() {
    let long = "x".repeat(200_000);
    let (out, _, _) = run_reader(format!("{long}\n"), 4, 3);
    assert_eq!(out, vec![long]);
}

#[test]
fn test_reader_stops_when_receivers_gone() {
    let state = PipelineState::new(Shard::single());
    let (tx, rx) = crossbeam_channel::bounded(1);
    drop(rx);
    let mut rng = SmallRng::seed_from_u64(0);
    let count = read_lines(Cursor::new(numbered_input(20)), tx, &state, 2, &mut rng).unwrap();
    assert!(count < 20);
}

/// Yields `data` once, then fails every read.
struct FailingReader {
    data: Option<Vec<u8>>,
}

impl std::io::Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.data.take() {
            Some(data) => {
                assert!(data.len() <= buf.len());
                buf[..data.len()].copy_from_slice(&data);
                Ok(data.len())
            }
            None => Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "device went away",
            )),
        }
    }
}

#[test]
fn test_reader_returns_input_error() {
    for capacity in [1, 1000] {
        let state = PipelineState::new(Shard::single());
        let (tx, rx) = unbounded();
        let reader = FailingReader {
            data: Some(b"a b c .\nd e f .\ng h i .\n".to_vec()),
        };
        let mut rng = SmallRng::seed_from_u64(5);
        let err = read_lines(reader, tx, &state, capacity, &mut rng).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Other);
        assert_eq!(state.counters.read(), 3, "capacity {capacity}");
        assert!(rx.iter().count() <= 3);
    }
}

// --- UidAssigner / UidEdgeBuilder ---

#[test]
fn test_uid_assigner_is_stable() {
    let uids = UidAssigner::new();
    let a = uids.get_or_assign("a").unwrap();
    let b = uids.get_or_assign("b").unwrap();
    assert_ne!(a, b);
    assert_eq!(uids.get_or_assign("a").unwrap(), a);
    assert_eq!(uids.uid_of("a"), Some(a));
    assert_eq!(uids.len(), 2);
}

#[test]
fn test_uid_literal_ids() {
    let uids = UidAssigner::new();
    assert_eq!(uids.get_or_assign("_uid_:0x1f").unwrap(), 31);
    assert_eq!(uids.get_or_assign("_uid_:12").unwrap(), 12);
    assert!(matches!(
        uids.get_or_assign("_uid_:zz"),
        Err(EdgeError::Permanent(_))
    ));
    assert!(uids.is_empty());
}

#[test]
fn test_uid_assigner_contention_is_not_an_error() {
    let uids = Arc::new(UidAssigner::new());
    let handles: Vec<_> = (0..16)
        .map(|t| {
            let uids = Arc::clone(&uids);
            thread::spawn(move || {
                (0..500)
                    .map(|i| {
                        // Half the ids are shared across threads, half are private.
                        let xid = if i % 2 == 0 {
                            format!("shared{i}")
                        } else {
                            format!("t{t}-{i}")
                        };
                        let uid = uids.get_or_assign(&xid).unwrap();
                        (xid, uid)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    let mut seen = std::collections::HashMap::new();
    for h in handles {
        for (xid, uid) in h.join().unwrap() {
            assert_eq!(*seen.entry(xid).or_insert(uid), uid);
        }
    }
    assert_eq!(uids.len(), seen.len());
    assert_eq!(uids.len(), 250 + 16 * 250);
    let distinct: std::collections::HashSet<u64> = seen.values().copied().collect();
    assert_eq!(distinct.len(), seen.len());
}

#[test]
fn test_edge_builder_uid_and_literal() {
    let builder = UidEdgeBuilder::default();
    let nq = parse_nquad("a knows b .").unwrap();
    let edge = builder.to_edge(&nq).unwrap();
    assert_eq!(edge.attribute, "knows");
    assert_eq!(Some(edge.entity), builder.uids().uid_of("a"));
    assert_eq!(
        edge.value,
        EdgeValue::Uid(builder.uids().uid_of("b").unwrap())
    );

    let nq = parse_nquad(r#"a name "Alice"@en ."#).unwrap();
    let edge = builder.to_edge(&nq).unwrap();
    assert_eq!(
        edge.value,
        EdgeValue::Literal {
            value: "Alice".to_string(),
            lang: Some("en".to_string()),
            datatype: None
        }
    );
}

#[test]
fn test_edge_builder_missing_object_is_permanent() {
    let nq = NQuad {
        subject: "a".to_string(),
        predicate: "b".to_string(),
        ..NQuad::default()
    };
    let err = UidEdgeBuilder::default().to_edge(&nq).unwrap_err();
    assert!(!err.is_transient());
}

// --- MemStore / Lease ---

#[test]
fn test_lease_released_once_on_explicit_release() {
    let store = MemStore::new();
    let key = PostingKey::new(1, "name");
    let lease = store.get_or_create(&key);
    assert_eq!(store.outstanding_leases(), 1);
    assert_eq!(store.list(&key).unwrap().refs(), 1);
    lease.release();
    assert_eq!(store.outstanding_leases(), 0);
    assert_eq!(store.leases_released(), 1);
    assert_eq!(store.list(&key).unwrap().refs(), 0);
}

#[test]
fn test_lease_released_on_drop() {
    let store = MemStore::new();
    {
        let _lease = store.get_or_create(&PostingKey::new(1, "name"));
        assert_eq!(store.outstanding_leases(), 1);
    }
    assert_eq!(store.outstanding_leases(), 0);
    assert_eq!(store.leases_released(), 1);
}

#[test]
fn test_set_mutation_with_index() {
    let store = MemStore::new();
    let builder = UidEdgeBuilder::default();
    let edge = builder
        .to_edge(&parse_nquad(r#"a name "Alice Smith" ."#).unwrap())
        .unwrap();
    let lease = store.get_or_create(&edge.key());
    assert!(lease.list().add_mutation_with_index(&edge, MutationOp::Set).unwrap());
    assert!(!lease.list().add_mutation_with_index(&edge, MutationOp::Set).unwrap());
    lease.release();

    assert_eq!(store.postings(&edge.key()), vec![edge.value.clone()]);
    assert_eq!(store.index().lookup("name", "alice"), vec![edge.entity]);
    assert_eq!(store.index().lookup("name", "SMITH"), vec![edge.entity]);

    let lease = store.get_or_create(&edge.key());
    assert!(lease.list().add_mutation_with_index(&edge, MutationOp::Del).unwrap());
    lease.release();
    assert!(store.postings(&edge.key()).is_empty());
    assert!(store.index().lookup("name", "alice").is_empty());
}

#[test]
fn test_mutation_on_wrong_list_is_error() {
    let store = MemStore::new();
    let edge = UidEdgeBuilder::default()
        .to_edge(&parse_nquad("a b c .").unwrap())
        .unwrap();
    let lease = store.get_or_create(&PostingKey::new(edge.entity + 100, "b"));
    assert!(lease.list().add_mutation_with_index(&edge, MutationOp::Set).is_err());
}

#[test]
fn test_tokenize() {
    assert_eq!(tokenize("Hello, World-42!"), vec!["hello", "world", "42"]);
    assert!(tokenize("  ").is_empty());
}

// --- config ---

#[test]
fn test_toml_applies_present_fields_only() {
    let file = parse_loader_toml(
        r#"
        [settings]
        num_instances = 4
        instance_idx = 3
        max_routines = 64
        metrics_interval_ms = 250
        "#,
    )
    .unwrap();
    let mut run = RunSettings::default();
    apply_file_to_settings(&file, &mut run);
    assert_eq!(run.num_instances, 4);
    assert_eq!(run.instance_idx, 3);
    assert_eq!(run.opts.max_routines, 64);
    assert_eq!(run.opts.metrics_interval, Duration::from_millis(250));
    assert_eq!(run.opts.window_capacity, 1000);
    assert!(!run.verbose);
}

#[test]
fn test_toml_unknown_key_rejected() {
    assert!(parse_loader_toml("[settings]\nmax_threads = 3\n").is_err());
}

#[test]
fn test_toml_loaded_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".edgeload.toml");
    std::fs::write(&path, "[settings]\nwindow_capacity = 10\nprogress = true\n").unwrap();
    let file = load_loader_toml(&path, false).unwrap().unwrap();
    let mut run = RunSettings::default();
    apply_file_to_settings(&file, &mut run);
    assert_eq!(run.opts.window_capacity, 10);
    assert!(run.progress);
    assert!(
        load_loader_toml(&dir.path().join("missing.toml"), false)
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_toml_invalid_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".edgeload.toml");
    std::fs::write(
        &path,
        "[settings]\nnum_instances = 2\ninstance_idx = 1\nmax_routine = 4\n",
    )
    .unwrap();
    let err = load_loader_toml(&path, false).unwrap_err();
    assert!(format!("{err:#}").contains("max_routine"));
}

#[test]
fn test_explicit_missing_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_loader_toml(&dir.path().join("nope.toml"), true).is_err());
}

#[test]
fn test_resolve_settings_rejects_bad_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("load.toml");
    std::fs::write(
        &path,
        "[settings]\nnum_instances = 2\ninstance_idx = 1\nmax_routine = 4\n",
    )
    .unwrap();
    let cfg = path.to_str().unwrap();
    let cli = Cli::try_parse_from(["edgeload", "-c", cfg, "data.nq"]).unwrap();
    assert!(resolve_settings(&cli).is_err());

    let missing = dir.path().join("missing.toml");
    let cli = Cli::try_parse_from(["edgeload", "-c", missing.to_str().unwrap(), "data.nq"]).unwrap();
    assert!(resolve_settings(&cli).is_err());
}

#[test]
fn test_resolve_settings_applies_explicit_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("load.toml");
    std::fs::write(&path, "[settings]\nnum_instances = 2\ninstance_idx = 1\n").unwrap();
    let cli = Cli::try_parse_from(["edgeload", "-c", path.to_str().unwrap(), "data.nq"]).unwrap();
    let run = resolve_settings(&cli).unwrap();
    assert_eq!((run.instance_idx, run.num_instances), (1, 2));
}

#[test]
fn test_cli_flags_override_file() {
    let file = parse_loader_toml("[settings]\nnum_instances = 4\nmax_routines = 64\n").unwrap();
    let cli = Cli::try_parse_from(["edgeload", "-n", "2", "-i", "1", "data.nq"]).unwrap();
    let mut run = RunSettings::default();
    apply_file_to_settings(&file, &mut run);
    apply_cli_to_settings(&cli, &mut run);
    assert_eq!(run.num_instances, 2);
    assert_eq!(run.instance_idx, 1);
    assert_eq!(run.opts.max_routines, 64);
}

#[test]
fn test_cli_requires_input() {
    assert!(Cli::try_parse_from(["edgeload"]).is_err());
}

// --- logging ---

#[test]
fn test_log_target_strips_crate_prefix() {
    assert_eq!(short_target("edgeload::pipeline::metrics"), "pipeline::metrics");
    assert_eq!(short_target("edgeload"), "main");
    assert_eq!(short_target("crossbeam_channel::flavors"), "crossbeam_channel::flavors");
}

#[test]
fn test_setup_logging_twice_is_harmless() {
    setup_logging(true);
    setup_logging(false);
    log::info!("logger initialized");
}
