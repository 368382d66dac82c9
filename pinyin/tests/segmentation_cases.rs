// Segmentation vectors for parse_user_pinyin: graph well-formedness over
// a spread of realistic and degenerate inputs, plus the canonical
// round-trip property of the syllable table.

use libshuru_core::SegmentGraph;
use libshuru_pinyin::{data, FuzzyFlags, PinyinEncoder};

/// Every node lies on a start-to-end path and edges only move forward.
fn assert_well_formed(graph: &SegmentGraph) {
    let mut reached_end = false;
    graph.dfs(&mut |_, path| {
        reached_end = true;
        let mut prev = 0;
        for &offset in path {
            assert!(offset > prev, "edge not forward at {offset}");
            prev = offset;
        }
        // One witness path is enough; ambiguous inputs have very many.
        false
    });
    assert!(reached_end || graph.size() == 0, "end unreachable");

    // Forward reachability: walking edges from the start covers every node.
    let mut reachable = vec![false; graph.size() + 1];
    reachable[0] = true;
    for node in graph.iter() {
        if !reachable[node.index()] {
            continue;
        }
        for &to in node.next() {
            reachable[to] = true;
        }
    }
    for node in graph.iter() {
        assert!(reachable[node.index()], "node {} unreachable", node.index());
        // Every non-end node must go somewhere.
        if node.index() < graph.size() {
            assert!(!node.next().is_empty(), "dead end at {}", node.index());
        }
    }
}

#[test]
fn test_realistic_inputs_are_well_formed() {
    let inputs = [
        "wojiushixiangceshi",
        "xian",
        "xiian",
        "tanan",
        "jin'an",
        "sh'a",
        "anqilaibufangbian",
        "zhizuoxujibianchengleshunshuituizhoudeshiqing",
        "xi'ian",
        "zuishengmengsi'''",
        "yongtiechuichuidanchuibupo",
        "feibenkerenyuanbunengrunei",
        "zhzxjbchlshshtzhdshq",
        "'xianshi",
        "zhuoyand",
        "nd",
        "'''",
    ];
    for input in inputs {
        for flags in [FuzzyFlags::NONE, FuzzyFlags::INNER, FuzzyFlags::ALL] {
            let graph = PinyinEncoder::parse_user_pinyin(input, flags);
            assert_eq!(graph.data(), input);
            assert_well_formed(&graph);
        }
    }
}

#[test]
fn test_degenerate_inputs() {
    for input in ["", "'", "q", "zzzzzzzz", "sdfsdfsdfsdfsdfsdf"] {
        let graph = PinyinEncoder::parse_user_pinyin(input, FuzzyFlags::ALL);
        assert_well_formed(&graph);
    }
}

#[test]
fn test_canonical_table_roundtrip() {
    // Every canonical spelling survives encode -> decode unchanged.
    for (text, entries) in data::pinyin_map() {
        if !entries.iter().any(|e| e.flags.is_empty()) {
            continue;
        }
        let code = PinyinEncoder::encode_full_pinyin(text)
            .unwrap_or_else(|_| panic!("canonical {text} must encode"));
        assert_eq!(code.len(), 2);
        let decoded = PinyinEncoder::decode_full_pinyin(&code).unwrap();
        assert_eq!(&decoded, text);
    }
}

#[test]
fn test_joined_roundtrip() {
    for joined in ["ni'hao", "zhong'guo'ren", "xi'an", "er'duo"] {
        let code = PinyinEncoder::encode_full_pinyin(joined).unwrap();
        assert_eq!(PinyinEncoder::decode_full_pinyin(&code).unwrap(), joined);
    }
}
