//! Code segmentation for table input.
//!
//! Table input has none of pinyin's spelling ambiguity: a code chunk is
//! over when no stored code continues it. The graph is therefore a single
//! greedy-longest chain of segments along stored-code paths (auto-learned
//! phrase codes run past the per-word `Length`, so the length limit does
//! not bound chunks here), with a one-key fallback for characters the
//! dictionary knows nothing about.

use libshuru_core::SegmentGraph;

use crate::dict::TableDict;

/// Segment a typed code string against the dictionary's stored codes.
pub fn graph_for_code(code: &str, dict: &TableDict) -> SegmentGraph {
    let mut graph = SegmentGraph::new(code.to_string());
    if code.is_empty() {
        return graph;
    }
    if !code.is_ascii() {
        graph.add_edge(0, code.len());
        return graph;
    }
    let bytes = code.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        let remaining = bytes.len() - pos;
        let mut step = 1;
        for len in (1..=remaining).rev() {
            if dict.has_code_path(&bytes[pos..pos + len]) {
                step = len;
                break;
            }
        }
        graph.add_edge(pos, pos + step);
        pos += step;
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::TableFlag;

    fn sample_dict() -> TableDict {
        let mut dict = TableDict::new();
        dict.load_text(&mut std::io::Cursor::new(
            "KeyCode=abcdefghijklmnopqrstuvwxy\nLength=4\n[Data]\naaaa 工\naaad 式\ndddd 在\n"
                .as_bytes(),
        ))
        .unwrap();
        dict.add_word("wq", "我", TableFlag::User).unwrap();
        dict
    }

    fn edges(graph: &SegmentGraph) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for node in graph.iter() {
            for &to in node.next() {
                out.push((node.index(), to));
            }
        }
        out
    }

    #[test]
    fn test_full_codes_chunk_at_code_boundaries() {
        let dict = sample_dict();
        let graph = graph_for_code("aaaadddd", &dict);
        assert_eq!(edges(&graph), vec![(0, 4), (4, 8)]);
    }

    #[test]
    fn test_learned_phrase_code_spans_one_segment() {
        let mut dict = sample_dict();
        dict.add_word("aaaadddd", "工在", TableFlag::Auto).unwrap();
        let graph = graph_for_code("aaaadddd", &dict);
        assert_eq!(edges(&graph), vec![(0, 8)]);
    }

    #[test]
    fn test_short_code_stays_whole() {
        let dict = sample_dict();
        let graph = graph_for_code("wq", &dict);
        assert_eq!(edges(&graph), vec![(0, 2)]);
    }

    #[test]
    fn test_trailing_partial_code() {
        let dict = sample_dict();
        let graph = graph_for_code("aaaaaa", &dict);
        // Four keys for the full code, the rest is an unfinished chunk.
        assert_eq!(edges(&graph), vec![(0, 4), (4, 6)]);
    }

    #[test]
    fn test_unknown_keys_fall_back_to_single_steps() {
        let dict = sample_dict();
        let graph = graph_for_code("xy", &dict);
        assert_eq!(edges(&graph), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_empty_code() {
        let dict = sample_dict();
        let graph = graph_for_code("", &dict);
        assert_eq!(graph.size(), 0);
        assert!(edges(&graph).is_empty());
    }
}
