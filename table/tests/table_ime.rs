// End-to-end flows through TableIme/TableContext: code segmentation,
// exact and partial-code candidates, selection, hints, and auto-learning.

use std::io::Cursor;
use std::rc::Rc;

use libshuru_core::{LanguageModelBuilder, UserLanguageModel};
use libshuru_table::{
    TableContext, TableDict, TableFlag, TableIme, TableLearning, TableOptions,
};

const TABLE_TEXT: &str = "\
KeyCode=abcdefghijklmnopqrstuvwxy
Length=4
Pinyin=@
Prompt=&
[Data]
aaaa 工
aaad 式
dddd 在
wq 我
";

fn make_ime(options: TableOptions) -> Rc<TableIme> {
    let mut dict = TableDict::new();
    dict.load_text(&mut Cursor::new(TABLE_TEXT.as_bytes()))
        .unwrap();

    let mut builder = LanguageModelBuilder::new();
    builder.add_sentence(&["工", "在"]);
    builder.add_sentence(&["工", "在"]);
    builder.add_word_count("工", 10);
    builder.add_word_count("在", 10);
    builder.add_word_count("我", 5);
    builder.add_word_count("式", 2);
    let model = UserLanguageModel::new(builder.build());

    let ime = Rc::new(TableIme::with_options(dict, model, options));
    ime.set_nbest(2);
    ime
}

#[test]
fn test_exact_code_candidate() {
    let ime = make_ime(TableOptions::default());
    let mut context = TableContext::new(Rc::clone(&ime));
    context.type_str("aaaa").unwrap();

    assert_eq!(context.candidates()[0].text(), "工");
    assert_eq!(context.sentence(), "工");
    assert_eq!(context.preedit(), "aaaa");
    // The code is fully typed, nothing left to hint.
    assert_eq!(context.candidate_hint(0), "");
}

#[test]
fn test_partial_code_offers_completions_with_hints() {
    let ime = make_ime(TableOptions::default());
    let mut context = TableContext::new(Rc::clone(&ime));
    context.type_str("aaa").unwrap();

    let texts: Vec<String> = context.candidates().iter().map(|c| c.text()).collect();
    assert!(texts.iter().any(|t| t == "工"), "{texts:?}");
    assert!(texts.iter().any(|t| t == "式"), "{texts:?}");

    let gong = texts.iter().position(|t| t == "工").unwrap();
    let shi = texts.iter().position(|t| t == "式").unwrap();
    assert_eq!(context.candidate_hint(gong), "a");
    assert_eq!(context.candidate_hint(shi), "d");
}

#[test]
fn test_two_codes_decode_as_sentence() {
    let ime = make_ime(TableOptions::default());
    let mut context = TableContext::new(Rc::clone(&ime));
    context.type_str("aaaadddd").unwrap();
    assert_eq!(context.sentence(), "工在");
}

#[test]
fn test_select_cancel_and_preedit() {
    let ime = make_ime(TableOptions::default());
    let mut context = TableContext::new(Rc::clone(&ime));
    context.type_str("aaaadddd").unwrap();

    let idx = context
        .candidates()
        .iter()
        .position(|c| c.text() == "工")
        .expect("single-word candidate");
    context.select(idx).unwrap();
    assert!(!context.selected());
    assert_eq!(context.preedit(), "工dddd");

    assert!(context.cancel());
    assert_eq!(context.preedit(), "aaaadddd");
}

#[test]
fn test_learn_auto_phrase() {
    let ime = make_ime(TableOptions {
        learning: TableLearning::Auto,
        ..TableOptions::default()
    });
    let mut context = TableContext::new(Rc::clone(&ime));
    context.type_str("aaaadddd").unwrap();

    let idx = context
        .candidates()
        .iter()
        .position(|c| c.text() == "工")
        .unwrap();
    context.select(idx).unwrap();
    let idx = context
        .candidates()
        .iter()
        .position(|c| c.text() == "在")
        .unwrap();
    context.select(idx).unwrap();
    assert!(context.selected());
    assert_eq!(context.selected_words(), vec!["工".to_string(), "在".to_string()]);
    context.learn();

    assert!(!ime.model().history().is_unknown("工"));
    let learned = ime.dict().lookup("aaaadddd");
    assert_eq!(learned.len(), 1);
    assert_eq!(learned[0].word, "工在");
    assert_eq!(learned[0].flag, TableFlag::Auto);

    // The learned phrase now matches as one exact-code word.
    context.clear();
    context.type_str("aaaadddd").unwrap();
    assert_eq!(context.candidates()[0].text(), "工在");
}

#[test]
fn test_unknown_keys_fall_back_to_literal() {
    let ime = make_ime(TableOptions::default());
    let mut context = TableContext::new(Rc::clone(&ime));
    context.type_str("xy").unwrap();
    assert_eq!(context.sentence(), "xy");
}

#[test]
fn test_is_valid_input() {
    let ime = make_ime(TableOptions::default());
    let context = TableContext::new(Rc::clone(&ime));
    assert!(context.is_valid_input('a'));
    assert!(context.is_valid_input('&'));
    assert!(context.is_valid_input('@'));
    assert!(!context.is_valid_input('9'));
    assert!(!context.is_valid_input('工'));
}

#[test]
fn test_backspace_and_cursor() {
    let ime = make_ime(TableOptions::default());
    let mut context = TableContext::new(Rc::clone(&ime));
    context.type_str("aaaa").unwrap();
    assert!(context.backspace());
    assert_eq!(context.user_input(), "aaa");
    assert!(context.set_cursor(9).is_err());
    context.set_cursor(0).unwrap();
    assert_eq!(context.preedit_with_cursor().1, 0);
}
