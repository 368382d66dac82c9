// End-to-end flows through PinyinIme/PinyinContext: typing, candidate
// ranking, selection, incremental re-decode and learning.

use std::io::Cursor;
use std::rc::Rc;

use libshuru_core::{LanguageModelBuilder, UserLanguageModel, SYSTEM_DICT};
use libshuru_pinyin::{
    FuzzyFlags, PinyinContext, PinyinDictFormat, PinyinDictionary, PinyinIme,
};

const DICT_TEXT: &str = "\
你好 ni'hao 0.0
你 ni 0.0
好 hao 0.0
泥 ni -0.5
耗 hao -0.5
西 xi -0.2
安 an -0.2
西安 xi'an 0.0
先 xian 0.0
现 xian -0.2
";

fn make_ime() -> Rc<PinyinIme> {
    let mut dict = PinyinDictionary::new();
    dict.load(
        SYSTEM_DICT,
        &mut Cursor::new(DICT_TEXT.as_bytes()),
        PinyinDictFormat::Text,
    )
    .unwrap();

    let mut builder = LanguageModelBuilder::new();
    builder.add_sentence(&["你好"]);
    builder.add_sentence(&["你好"]);
    builder.add_sentence(&["你", "好"]);
    builder.add_sentence(&["西安"]);
    builder.add_word_count("你好", 16);
    builder.add_word_count("先", 4);
    builder.add_word_count("现", 2);
    builder.add_word_count("泥", 1);
    builder.add_word_count("耗", 1);
    let model = UserLanguageModel::new(builder.build());

    let ime = Rc::new(PinyinIme::new(dict, model));
    ime.set_nbest(2);
    ime
}

#[test]
fn test_basic_pinyin_best_sentence() {
    let ime = make_ime();
    let mut context = PinyinContext::new(Rc::clone(&ime));
    context.type_str("nihao").unwrap();

    assert!(!context.candidates().is_empty());
    assert_eq!(context.candidates()[0].text(), "你好");
    assert_eq!(context.sentence(), "你好");
    assert_eq!(context.preedit(), "nihao");
}

#[test]
fn test_fuzzy_inner_offers_both_readings() {
    let ime = make_ime();
    ime.set_fuzzy_flags(FuzzyFlags::INNER);
    let mut context = PinyinContext::new(Rc::clone(&ime));
    context.type_str("xian").unwrap();

    let texts: Vec<String> = context.candidates().iter().map(|c| c.text()).collect();
    // The single-syllable reading and the split reading both produce
    // candidates.
    assert!(texts.iter().any(|t| t == "先" || t == "现"), "{texts:?}");
    assert!(texts.iter().any(|t| t == "西安"), "{texts:?}");
}

#[test]
fn test_incremental_typing_matches_batch() {
    let ime = make_ime();

    let mut incremental = PinyinContext::new(Rc::clone(&ime));
    for c in "nihao".chars() {
        incremental.type_str(&c.to_string()).unwrap();
    }

    let mut batch = PinyinContext::new(Rc::clone(&ime));
    batch.type_str("nihao").unwrap();

    let a: Vec<(String, f32)> = incremental
        .candidates()
        .iter()
        .map(|c| (c.text(), c.score))
        .collect();
    let b: Vec<(String, f32)> = batch
        .candidates()
        .iter()
        .map(|c| (c.text(), c.score))
        .collect();
    assert_eq!(a.len(), b.len());
    for ((ta, sa), (tb, sb)) in a.iter().zip(b.iter()) {
        assert_eq!(ta, tb);
        assert!((sa - sb).abs() < 1e-6, "{ta}: {sa} vs {sb}");
    }
}

#[test]
fn test_select_partial_then_finish() {
    let ime = make_ime();
    let mut context = PinyinContext::new(Rc::clone(&ime));
    context.type_str("nihao").unwrap();

    // Select the single word 你 covering just "ni".
    let idx = context
        .candidates()
        .iter()
        .position(|c| c.text() == "你")
        .expect("single-word candidate");
    context.select(idx).unwrap();
    assert!(!context.selected());
    assert_eq!(context.preedit(), "你hao");

    // The rest re-decodes; pick the best remaining candidate.
    let idx = context
        .candidates()
        .iter()
        .position(|c| c.text() == "好")
        .expect("remaining candidate");
    context.select(idx).unwrap();
    assert!(context.selected());
    assert_eq!(context.preedit(), "你好");
    assert_eq!(context.sentence(), "你好");
}

#[test]
fn test_cancel_restores_input() {
    let ime = make_ime();
    let mut context = PinyinContext::new(Rc::clone(&ime));
    context.type_str("nihao").unwrap();

    let idx = context
        .candidates()
        .iter()
        .position(|c| c.text() == "你")
        .unwrap();
    context.select(idx).unwrap();
    assert_eq!(context.preedit(), "你hao");

    assert!(context.cancel());
    assert_eq!(context.preedit(), "nihao");
    assert!(!context.cancel() || context.preedit() == "nihao");
}

#[test]
fn test_backspace_and_cursor() {
    let ime = make_ime();
    let mut context = PinyinContext::new(Rc::clone(&ime));
    context.type_str("nihao").unwrap();
    assert!(context.backspace());
    assert_eq!(context.user_input(), "niha");

    context.set_cursor(2).unwrap();
    context.type_str("x").unwrap();
    assert_eq!(context.user_input(), "nixha");
    assert!(context.set_cursor(99).is_err());
}

#[test]
fn test_learn_boosts_selected_words() {
    let ime = make_ime();
    ime.set_nbest(5);
    let mut context = PinyinContext::new(Rc::clone(&ime));

    let score_of = |context: &PinyinContext, text: &str| -> Option<f32> {
        context
            .candidates()
            .iter()
            .find(|c| c.text() == text)
            .map(|c| c.score)
    };

    context.type_str("nihao").unwrap();
    let before = score_of(&context, "泥耗").expect("泥耗 among nbest");

    // Commit 泥 then 耗 and learn.
    let idx = context
        .candidates()
        .iter()
        .position(|c| c.text() == "泥")
        .unwrap();
    context.select(idx).unwrap();
    let idx = context
        .candidates()
        .iter()
        .position(|c| c.text() == "耗")
        .unwrap();
    context.select(idx).unwrap();
    assert!(context.selected());
    context.learn();

    // History now knows both words, and the pair entered the user dict.
    assert!(!ime.model().history().is_unknown("泥"));
    assert!(!ime.model().history().is_unknown("耗"));
    let code = libshuru_pinyin::PinyinEncoder::encode_full_pinyin("ni'hao").unwrap();
    assert!(ime.dict().word_exists(&code, "泥耗"));

    context.clear();
    context.type_str("nihao").unwrap();
    let after = score_of(&context, "泥耗").expect("泥耗 still among candidates");
    assert!(after > before + 1.0, "{after} vs {before}");
}

#[test]
fn test_empty_and_unparseable_input() {
    let ime = make_ime();
    let mut context = PinyinContext::new(Rc::clone(&ime));
    assert!(context.candidates().is_empty());
    assert_eq!(context.sentence(), "");

    // Unknown letters still produce a literal fallback, never a panic.
    context.type_str("vvv").unwrap();
    assert!(!context.candidates().is_empty());

    context.clear();
    assert!(context.candidates().is_empty());
    assert!(context.type_str("你").is_err());
}
