//! 正規化済みコメントから TF-IDF 特徴量を抽出する。
use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use sprs::CsVec;

use crate::artifacts::ArtifactError;

/// 疎な特徴ベクトル。次元数は語彙サイズと一致する。
pub type FeatureVector = CsVec<f64>;

pub(crate) const DEFAULT_MIN_TOKEN_LEN: usize = 2;

/// ベクトルの正規化方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    L1,
    None,
}

/// 学習済みベクトライザのシリアライズ形式。
#[derive(Debug, Deserialize)]
pub(crate) struct VectorizerArtifact {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default, deserialize_with = "deserialize_norm")]
    norm: Norm,
    #[serde(default = "default_min_token_len")]
    min_token_len: usize,
    #[serde(default)]
    version: Option<String>,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_min_token_len() -> usize {
    DEFAULT_MIN_TOKEN_LEN
}

// `"norm": null` is how an unnormalised vectorizer gets exported.
fn deserialize_norm<'de, D>(deserializer: D) -> Result<Norm, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Norm>::deserialize(deserializer)?.unwrap_or(Norm::None))
}

impl VectorizerArtifact {
    fn validate(&self) -> Result<(), ArtifactError> {
        let dim = self.idf.len();
        if dim == 0 {
            return Err(ArtifactError::invalid("vectorizer vocabulary is empty"));
        }
        if self.vocabulary.len() != dim {
            return Err(ArtifactError::invalid(format!(
                "vocabulary size {} does not match idf length {dim}",
                self.vocabulary.len()
            )));
        }
        let mut seen = vec![false; dim];
        for (term, &index) in &self.vocabulary {
            let slot = seen.get_mut(index).ok_or_else(|| {
                ArtifactError::invalid(format!("term {term:?} maps to out-of-range column {index}"))
            })?;
            if *slot {
                return Err(ArtifactError::invalid(format!(
                    "column {index} is assigned to more than one term"
                )));
            }
            *slot = true;
        }
        if let Some(bad) = self.idf.iter().position(|w| !w.is_finite() || *w <= 0.0) {
            return Err(ArtifactError::invalid(format!(
                "idf weight at column {bad} must be finite and positive"
            )));
        }
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ArtifactError::invalid(format!(
                "invalid ngram_range ({min_n}, {max_n})"
            )));
        }
        Ok(())
    }
}

/// 学習時に fit 済みの語彙と IDF を使って変換だけを行うベクトライザ。
///
/// 推論時に再 fit することはない。語彙にない語は無視される。
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocab_index: HashMap<String, usize>,
    idf: Vec<f64>,
    ngram_range: (usize, usize),
    sublinear_tf: bool,
    norm: Norm,
    min_token_len: usize,
    version: Option<String>,
}

impl TfidfVectorizer {
    /// 語彙と IDF から直接構築する。
    ///
    /// # Errors
    /// 語彙のインデックスが IDF と整合しない場合は [`ArtifactError::Invalid`] を返す。
    pub fn from_parts(
        vocabulary: HashMap<String, usize>,
        idf: Vec<f64>,
        ngram_range: (usize, usize),
        sublinear_tf: bool,
        norm: Norm,
    ) -> Result<Self, ArtifactError> {
        Self::from_artifact(VectorizerArtifact {
            vocabulary,
            idf,
            ngram_range,
            sublinear_tf,
            norm,
            min_token_len: DEFAULT_MIN_TOKEN_LEN,
            version: None,
        })
    }

    pub(crate) fn from_artifact(artifact: VectorizerArtifact) -> Result<Self, ArtifactError> {
        artifact.validate()?;
        Ok(Self {
            vocab_index: artifact.vocabulary,
            idf: artifact.idf,
            ngram_range: artifact.ngram_range,
            sublinear_tf: artifact.sublinear_tf,
            norm: artifact.norm,
            min_token_len: artifact.min_token_len,
            version: artifact.version,
        })
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.idf.len()
    }

    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// 正規化済みテキストを疎ベクトルに変換する。空文字列はゼロベクトルになる。
    #[must_use]
    pub fn transform(&self, cleaned: &str) -> FeatureVector {
        let counts = self.term_counts(cleaned);
        let mut weighted: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(index, count)| {
                #[allow(clippy::cast_precision_loss)]
                let raw = count as f64;
                let tf = if self.sublinear_tf { 1.0 + raw.ln() } else { raw };
                (index, tf * self.idf[index])
            })
            .collect();

        let scale = match self.norm {
            Norm::L2 => weighted.iter().map(|(_, v)| v * v).sum::<f64>().sqrt(),
            Norm::L1 => weighted.iter().map(|(_, v)| v.abs()).sum::<f64>(),
            Norm::None => 1.0,
        };
        if scale > 0.0 {
            for (_, value) in &mut weighted {
                *value /= scale;
            }
        }

        // BTreeMap iteration keeps indices sorted, which CsVec requires.
        let (indices, data): (Vec<usize>, Vec<f64>) = weighted.into_iter().unzip();
        CsVec::new(self.dim(), indices, data)
    }

    fn term_counts(&self, cleaned: &str) -> BTreeMap<usize, usize> {
        let words: Vec<&str> = cleaned
            .split_whitespace()
            .filter(|word| word.chars().count() >= self.min_token_len)
            .collect();
        let (min_n, max_n) = self.ngram_range;
        let mut counts = BTreeMap::new();
        for n in min_n..=max_n {
            for gram in words.windows(n) {
                let term = gram.join(" ");
                if let Some(&index) = self.vocab_index.get(&term) {
                    *counts.entry(index).or_insert(0) += 1;
                }
            }
        }
        counts
    }
}
