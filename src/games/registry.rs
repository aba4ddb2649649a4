use crate::config::harness::HarnessConfig;
use crate::config::types::{GameKind, HarnessError, Result};
use crate::games::numbers::NumbersDriver;
use crate::games::split::SplitDriver;
use crate::games::strtok::StrtokDriver;
use crate::games::GameDriver;
use std::path::Path;

/// Build the driver for `game`. Split and strtok read their corpus from
/// `corpus`; numbers generates its interval and ignores it.
pub fn driver_for(
    game: GameKind,
    config: &HarnessConfig,
    corpus: Option<&Path>,
) -> Result<Box<dyn GameDriver>> {
    let need_corpus = || {
        corpus.ok_or_else(|| {
            HarnessError::Config(format!("game '{}' requires a corpus path", game))
        })
    };

    match game {
        GameKind::Numbers => Ok(Box::new(NumbersDriver::new(config.numbers.clone())?)),
        GameKind::Split => Ok(Box::new(SplitDriver::from_corpus_dir(
            config.split.clone(),
            need_corpus()?,
        )?)),
        GameKind::Strtok => Ok(Box::new(StrtokDriver::from_corpus(
            config.strtok.clone(),
            need_corpus()?,
        )?)),
    }
}
