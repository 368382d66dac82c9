// Cross-module flow at the core level: a trie-backed dictionary feeding
// the decoder, the user model learning from history, and every artifact
// surviving a save/load cycle with identical scores.

use std::io::Cursor;

use libshuru_core::{
    DatTrie, DecodeParams, Decoder, Dictionary, HistoryBigram, LanguageModel,
    LanguageModelBase, LanguageModelBuilder, Lattice, LatticeNodeData, SegmentGraph,
    SegmentGraphNodeId, UserLanguageModel, WordNode, UNKNOWN_WORD,
};

/// Minimal dictionary: keys are raw segment texts, values index a word
/// list. Enough to drive the decoder without a front-end crate.
struct SegmentDict {
    trie: DatTrie<i32>,
    words: Vec<Vec<(String, f32)>>,
}

impl SegmentDict {
    fn new(entries: &[(&str, &[(&str, f32)])]) -> Self {
        let mut trie = DatTrie::new();
        let mut words = Vec::new();
        for (code, list) in entries {
            trie.set(code.as_bytes(), words.len() as i32);
            words.push(list.iter().map(|(w, c)| (w.to_string(), *c)).collect());
        }
        Self { trie, words }
    }
}

impl Dictionary for SegmentDict {
    type MatchHelper = ();

    fn match_prefix(
        &self,
        graph: &SegmentGraph,
        _helper: Option<&mut ()>,
        cb: &mut dyn FnMut(&[SegmentGraphNodeId], WordNode, f32, LatticeNodeData),
    ) {
        for node in graph.iter() {
            for &to in node.next() {
                let segment = graph.segment(node.index(), to);
                if let Some(idx) = self.trie.get(segment.as_bytes()) {
                    let path = [node.id(), graph.node_at(to).unwrap().id()];
                    for (word, cost) in &self.words[idx as usize] {
                        cb(
                            &path,
                            WordNode::new(word.as_str(), UNKNOWN_WORD),
                            *cost,
                            LatticeNodeData::none(),
                        );
                    }
                }
            }
        }
    }
}

fn graph_for(data: &str, cut: usize) -> SegmentGraph {
    let mut graph = SegmentGraph::new(data.to_string());
    graph.add_edge(0, cut);
    graph.add_edge(cut, data.len());
    graph
}

fn build_model() -> LanguageModel {
    let mut builder = LanguageModelBuilder::new();
    builder.add_sentence(&["你", "好"]);
    builder.add_sentence(&["你", "好"]);
    builder.add_word_count("你", 10);
    builder.add_word_count("好", 10);
    builder.add_word_count("泥", 1);
    builder.add_word_count("耗", 1);
    builder.build()
}

fn decode_best(dict: &SegmentDict, model: &dyn LanguageModelBase) -> (String, f32) {
    let graph = graph_for("nihao", 2);
    let mut lattice = Lattice::new();
    let params = DecodeParams::new(model.null_state()).with_nbest(2);
    Decoder::decode(dict, model, &mut lattice, &graph, &params, None);
    let best = lattice.sentence(0).expect("a sentence");
    (best.text(), best.score)
}

fn sample_dict() -> SegmentDict {
    SegmentDict::new(&[
        ("ni", &[("你", 0.0), ("泥", -0.5)]),
        ("hao", &[("好", 0.0), ("耗", -0.5)]),
    ])
}

#[test]
fn test_decode_learn_then_persist() -> anyhow::Result<()> {
    let dict = sample_dict();
    let model = build_model();

    // Static model alone prefers the frequent words.
    let (text, _) = decode_best(&dict, &model);
    assert_eq!(text, "你好");

    // The user model tracks history: teach it the unlikely reading.
    let user = UserLanguageModel::new(build_model());
    let (_, score_before) = decode_best(&dict, &user);
    for _ in 0..8 {
        user.history_mut().add(&["泥", "耗"]);
    }
    let (text, _) = decode_best(&dict, &user);
    assert_eq!(text, "泥耗");

    // Persist the history, reload into a fresh user model, same outcome.
    let mut dump = Vec::new();
    user.history().save(&mut dump)?;
    let mut history = HistoryBigram::default();
    history.load(&mut Cursor::new(&dump))?;
    let reloaded = UserLanguageModel::with_history(build_model(), history);
    let (text, score) = decode_best(&dict, &reloaded);
    assert_eq!(text, "泥耗");
    assert!(score > score_before);
    Ok(())
}

#[test]
fn test_language_model_image_preserves_scores() -> anyhow::Result<()> {
    let dict = sample_dict();
    let model = build_model();
    let (_, score) = decode_best(&dict, &model);

    let mut image = Vec::new();
    model.save(&mut image)?;
    let reloaded = LanguageModel::load(&mut Cursor::new(&image))?;
    let (text, reloaded_score) = decode_best(&dict, &reloaded);
    assert_eq!(text, "你好");
    assert!((score - reloaded_score).abs() < 1e-6);
    Ok(())
}
