//! Engine handle shared by table contexts.
//!
//! Owns the table dictionary, the user language model, the runtime
//! options and the decode knobs, the same shape as the pinyin engine
//! handle. Contexts hold an `Rc` and read the knobs on every update;
//! dictionary mutation goes through the `RefCell` and must not overlap an
//! in-flight decode.

use std::cell::{Cell, Ref, RefCell, RefMut};

use libshuru_core::{
    DecoderConfig, UserLanguageModel, BEAM_SIZE_DEFAULT, FRAME_SIZE_DEFAULT,
};

use crate::dict::TableDict;
use crate::options::TableOptions;

pub struct TableIme {
    dict: RefCell<TableDict>,
    model: UserLanguageModel,
    options: RefCell<TableOptions>,
    nbest: Cell<usize>,
    beam_size: Cell<usize>,
    frame_size: Cell<usize>,
    max_distance: Cell<f32>,
    min_score: Cell<f32>,
}

impl TableIme {
    pub fn new(dict: TableDict, model: UserLanguageModel) -> Self {
        Self::with_options(dict, model, TableOptions::default())
    }

    pub fn with_options(dict: TableDict, model: UserLanguageModel, options: TableOptions) -> Self {
        Self {
            dict: RefCell::new(dict),
            model,
            options: RefCell::new(options),
            nbest: Cell::new(1),
            beam_size: Cell::new(BEAM_SIZE_DEFAULT),
            frame_size: Cell::new(FRAME_SIZE_DEFAULT),
            max_distance: Cell::new(f32::MAX),
            min_score: Cell::new(f32::MIN),
        }
    }

    pub fn apply_decoder_config(&self, config: &DecoderConfig) {
        self.nbest.set(config.nbest.max(1));
        self.beam_size.set(config.beam_size.max(1));
        self.frame_size.set(config.frame_size.max(1));
        self.max_distance.set(config.max_distance);
        self.min_score.set(config.min_score);
    }

    pub fn dict(&self) -> Ref<'_, TableDict> {
        self.dict.borrow()
    }

    pub fn dict_mut(&self) -> RefMut<'_, TableDict> {
        self.dict.borrow_mut()
    }

    pub fn model(&self) -> &UserLanguageModel {
        &self.model
    }

    pub fn options(&self) -> Ref<'_, TableOptions> {
        self.options.borrow()
    }

    pub fn set_options(&self, options: TableOptions) {
        *self.options.borrow_mut() = options;
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
}
