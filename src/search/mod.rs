//! Random search with optional hill climbing over text model configurations

use crate::core::{NoProgress, Progress, Result, SVMError};
use crate::kfold::{predict_kfold, KFoldOptions};
use crate::text::{TextModelConfig, TokenOption};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Scores a text model configuration; higher is better
pub trait Objective {
    fn score(&self, config: &TextModelConfig) -> Result<f64>;
}

impl<F> Objective for F
where
    F: Fn(&TextModelConfig) -> Result<f64>,
{
    fn score(&self, config: &TextModelConfig) -> Result<f64> {
        self(config)
    }
}

/// K-fold accuracy of a configuration on a labeled record file
#[derive(Debug, Clone)]
pub struct KFoldObjective {
    path: PathBuf,
    options: KFoldOptions,
}

impl KFoldObjective {
    pub fn new(path: impl Into<PathBuf>, options: KFoldOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }
}

impl Objective for KFoldObjective {
    fn score(&self, config: &TextModelConfig) -> Result<f64> {
        predict_kfold(&self.path, Some(config), &self.options)?
            .accuracy()
            .ok_or_else(|| SVMError::InvalidParameter("k-fold did not return an accuracy".to_string()))
    }
}

/// Choices available for each configuration option
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpace {
    /// Values tried for `url_option`, `usr_option`, `num_option` and `emo_option`
    pub token_options: Vec<TokenOption>,
    /// Pool the token list is drawn from
    pub token_candidates: Vec<i32>,
}

impl Default for ParameterSpace {
    fn default() -> Self {
        Self {
            token_options: TokenOption::ALL.to_vec(),
            token_candidates: vec![-3, -2, -1, 1, 2, 3, 4, 5, 6, 7],
        }
    }
}

impl ParameterSpace {
    pub fn validate(&self) -> Result<()> {
        if self.token_options.is_empty() {
            return Err(SVMError::InvalidParameter(
                "token_options must not be empty".to_string(),
            ));
        }
        if self.token_candidates.is_empty() || self.token_candidates.contains(&0) {
            return Err(SVMError::InvalidParameter(
                "token_candidates must be non-empty and non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Draw a random configuration; the token list is a sorted non-empty subset
    /// of the candidates
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> TextModelConfig {
        let mut token_list = self.token_candidates.clone();
        token_list.shuffle(rng);
        token_list.truncate(rng.random_range(1..=self.token_candidates.len()));
        token_list.sort_unstable();

        TextModelConfig {
            lc: rng.random_bool(0.5),
            strip_diac: rng.random_bool(0.5),
            del_dup: rng.random_bool(0.5),
            del_punc: rng.random_bool(0.5),
            url_option: self.pick_option(rng),
            usr_option: self.pick_option(rng),
            num_option: self.pick_option(rng),
            emo_option: self.pick_option(rng),
            token_list,
            tfidf: rng.random_bool(0.5),
        }
    }

    fn pick_option<R: Rng + ?Sized>(&self, rng: &mut R) -> TokenOption {
        self.token_options[rng.random_range(0..self.token_options.len())]
    }

    /// Every configuration that differs from `config` in exactly one option.
    ///
    /// Token list neighbors add or remove one candidate; the list never
    /// becomes empty.
    pub fn neighbors(&self, config: &TextModelConfig) -> Vec<TextModelConfig> {
        let mut out = Vec::new();

        let flips: [fn(&mut TextModelConfig); 5] = [
            |c| c.lc = !c.lc,
            |c| c.strip_diac = !c.strip_diac,
            |c| c.del_dup = !c.del_dup,
            |c| c.del_punc = !c.del_punc,
            |c| c.tfidf = !c.tfidf,
        ];
        for flip in flips {
            let mut next = config.clone();
            flip(&mut next);
            out.push(next);
        }

        for field in 0..4 {
            for &option in &self.token_options {
                let mut next = config.clone();
                let slot = token_option_mut(&mut next, field);
                if *slot != option {
                    *slot = option;
                    out.push(next);
                }
            }
        }

        for &candidate in &self.token_candidates {
            let mut next = config.clone();
            if let Some(pos) = next.token_list.iter().position(|&t| t == candidate) {
                if next.token_list.len() == 1 {
                    continue;
                }
                next.token_list.remove(pos);
            } else {
                next.token_list.push(candidate);
                next.token_list.sort_unstable();
            }
            out.push(next);
        }

        out
    }
}

fn token_option_mut(config: &mut TextModelConfig, field: usize) -> &mut TokenOption {
    match field {
        0 => &mut config.url_option,
        1 => &mut config.usr_option,
        2 => &mut config.num_option,
        _ => &mut config.emo_option,
    }
}

/// A configuration together with its objective score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredConfig {
    pub config: TextModelConfig,
    pub score: f64,
}

/// Random search over a [`ParameterSpace`]
#[derive(Debug, Clone)]
pub struct ParameterSelection {
    space: ParameterSpace,
    seed: u64,
}

impl Default for ParameterSelection {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ParameterSelection {
    pub fn new(seed: u64) -> Self {
        Self {
            space: ParameterSpace::default(),
            seed,
        }
    }

    pub fn with_space(mut self, space: ParameterSpace) -> Self {
        self.space = space;
        self
    }

    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    /// Score `batch_size` random configurations, best first.
    ///
    /// Duplicate draws are skipped. With `hill_climb` the best configuration
    /// is then moved to its best unseen neighbor while that improves the
    /// score.
    pub fn search<O: Objective + ?Sized>(
        &self,
        objective: &O,
        batch_size: usize,
        hill_climb: bool,
    ) -> Result<Vec<ScoredConfig>> {
        self.search_with_progress(objective, batch_size, hill_climb, &mut NoProgress)
    }

    /// [`search`](Self::search) reporting one step per random draw
    pub fn search_with_progress<O: Objective + ?Sized>(
        &self,
        objective: &O,
        batch_size: usize,
        hill_climb: bool,
        progress: &mut dyn Progress,
    ) -> Result<Vec<ScoredConfig>> {
        if batch_size == 0 {
            return Err(SVMError::InvalidParameter(
                "batch_size must be positive".to_string(),
            ));
        }
        self.space.validate()?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut tabu: HashSet<TextModelConfig> = HashSet::new();
        let mut scored = Vec::with_capacity(batch_size);

        progress.start(batch_size);
        for _ in 0..batch_size {
            let config = self.space.sample(&mut rng);
            if tabu.insert(config.clone()) {
                let score = objective.score(&config)?;
                debug!("score {score:.4} for {config:?}");
                scored.push(ScoredConfig { config, score });
            } else {
                debug!("skipping repeated configuration");
            }
            progress.advance();
        }
        progress.finish();
        sort_best_first(&mut scored);

        if hill_climb {
            if let Some(mut best) = scored.first().cloned() {
                loop {
                    let mut improved: Option<ScoredConfig> = None;
                    for neighbor in self.space.neighbors(&best.config) {
                        if !tabu.insert(neighbor.clone()) {
                            continue;
                        }
                        let score = objective.score(&neighbor)?;
                        let candidate = ScoredConfig {
                            config: neighbor,
                            score,
                        };
                        if score > improved.as_ref().map_or(best.score, |c| c.score) {
                            improved = Some(candidate.clone());
                        }
                        scored.push(candidate);
                    }

                    match improved {
                        Some(next) => {
                            info!("hill climbing: {:.4} -> {:.4}", best.score, next.score);
                            best = next;
                        }
                        None => break,
                    }
                }
                sort_best_first(&mut scored);
            }
        }

        Ok(scored)
    }
}

fn sort_best_first(scored: &mut [ScoredConfig]) {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// Best of `n_params` random configurations by `n_folds`-fold accuracy
pub fn predict_kfold_params<P: AsRef<Path>>(
    path: P,
    n_folds: usize,
    n_params: usize,
) -> Result<ScoredConfig> {
    if n_params == 0 {
        return Err(SVMError::InvalidParameter(
            "n_params must be positive".to_string(),
        ));
    }

    let objective = KFoldObjective::new(
        path.as_ref(),
        KFoldOptions::default().with_n_folds(n_folds),
    );
    ParameterSelection::default()
        .search(&objective, n_params, false)?
        .into_iter()
        .next()
        .ok_or(SVMError::EmptyDataset)
}
