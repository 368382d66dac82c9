//! Engine handle shared by pinyin contexts.
//!
//! Owns the dictionary, the user language model and the decode knobs.
//! Contexts hold an `Rc` to this and read the knobs on every update, so
//! the host can flip fuzzy flags or the shuangpin profile at runtime;
//! dictionary mutation goes through the `RefCell` and must not overlap an
//! in-flight decode (single-threaded contract).

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use libshuru_core::{
    DecoderConfig, EngineConfig, UserLanguageModel, BEAM_SIZE_DEFAULT, FRAME_SIZE_DEFAULT,
};

use crate::dict::PinyinDictionary;
use crate::shuangpin::ShuangpinProfile;
use crate::syllable::FuzzyFlags;

pub struct PinyinIme {
    dict: RefCell<PinyinDictionary>,
    model: UserLanguageModel,
    fuzzy_flags: Cell<FuzzyFlags>,
    nbest: Cell<usize>,
    beam_size: Cell<usize>,
    frame_size: Cell<usize>,
    max_distance: Cell<f32>,
    min_score: Cell<f32>,
    shuangpin: RefCell<Option<Rc<ShuangpinProfile>>>,
}

impl PinyinIme {
    pub fn new(dict: PinyinDictionary, model: UserLanguageModel) -> Self {
        Self {
            dict: RefCell::new(dict),
            model,
            fuzzy_flags: Cell::new(FuzzyFlags::NONE),
            nbest: Cell::new(1),
            beam_size: Cell::new(BEAM_SIZE_DEFAULT),
            frame_size: Cell::new(FRAME_SIZE_DEFAULT),
            max_distance: Cell::new(f32::MAX),
            min_score: Cell::new(f32::MIN),
            shuangpin: RefCell::new(None),
        }
    }

    /// Construct with knobs taken from a loaded config.
    pub fn with_config(
        dict: PinyinDictionary,
        model: UserLanguageModel,
        config: &EngineConfig,
    ) -> Self {
        let ime = Self::new(dict, model);
        ime.set_fuzzy_flags(FuzzyFlags::from_names(&config.fuzzy));
        ime.apply_decoder_config(&config.decoder);
        ime
    }

    pub fn apply_decoder_config(&self, config: &DecoderConfig) {
        self.nbest.set(config.nbest.max(1));
        self.beam_size.set(config.beam_size.max(1));
        self.frame_size.set(config.frame_size.max(1));
        self.max_distance.set(config.max_distance);
        self.min_score.set(config.min_score);
    }

    pub fn dict(&self) -> Ref<'_, PinyinDictionary> {
        self.dict.borrow()
    }

    pub fn dict_mut(&self) -> RefMut<'_, PinyinDictionary> {
        self.dict.borrow_mut()
    }

    pub fn model(&self) -> &UserLanguageModel {
        &self.model
    }

    pub fn fuzzy_flags(&self) -> FuzzyFlags {
        self.fuzzy_flags.get()
    }

    pub fn set_fuzzy_flags(&self, flags: FuzzyFlags) {
        self.fuzzy_flags.set(flags);
    }

    pub fn nbest(&self) -> usize {
        self.nbest.get()
    }

    pub fn set_nbest(&self, nbest: usize) {
        self.nbest.set(nbest.max(1));
    }

    pub fn beam_size(&self) -> usize {
        self.beam_size.get()
    }

    pub fn set_beam_size(&self, beam_size: usize) {
        self.beam_size.set(beam_size.max(1));
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size.get()
    }

    pub fn set_frame_size(&self, frame_size: usize) {
        self.frame_size.set(frame_size.max(1));
    }

    pub fn max_distance(&self) -> f32 {
        self.max_distance.get()
    }

    /// Reject sentences scoring further than this below the best one.
    pub fn set_score_filter(&self, max_distance: f32) {
        self.max_distance.set(max_distance);
    }

    pub fn min_score(&self) -> f32 {
        self.min_score.get()
    }

    pub fn set_min_score(&self, min_score: f32) {
        self.min_score.set(min_score);
    }

    pub fn shuangpin_profile(&self) -> Option<Rc<ShuangpinProfile>> {
        self.shuangpin.borrow().clone()
    }

    /// Switch between full pinyin (`None`) and a shuangpin layout.
    pub fn set_shuangpin_profile(&self, profile: Option<Rc<ShuangpinProfile>>) {
        *self.shuangpin.borrow_mut() = profile;
    }
}
