mod init;
mod layout;

use std::{collections::HashMap, fs, path::Path};

use log::info;
use rand::{SeedableRng, rngs::StdRng};
use safetensors::{Dtype, SafeTensors, tensor::TensorView};

use crate::{Result, SynthErr, spec::ModelSpec};

pub use init::{ConstWeightGen, WeightGen, XavierWeightGen};
pub use layout::{ParameterLayout, TensorSlot};

/// Metadata key under which the model spec is stored in a weights file.
pub const SPEC_KEY: &str = "inkforge.spec";

/// The parameters of a handwriting model as a single flat buffer plus the layout that names its
/// tensors.
#[derive(Debug, Clone)]
pub struct ModelWeights {
    spec: ModelSpec,
    layout: ParameterLayout,
    params: Vec<f32>,
}

impl ModelWeights {
    /// Creates weights for `spec` filling every tensor through `weight_gen`.
    ///
    /// # Arguments
    /// * `spec` - The model hyperparameters.
    /// * `weight_gen` - The generator of the initial values.
    ///
    /// # Returns
    /// The new weights or an error if the spec is invalid.
    pub fn generate<W: WeightGen>(spec: ModelSpec, mut weight_gen: W) -> Result<Self> {
        spec.validate()?;

        let layout = ParameterLayout::new(&spec);
        let mut params = vec![0.0; layout.len()];

        for slot in layout.slots() {
            weight_gen.fill(slot, &mut params[slot.range.clone()])?;
        }

        Ok(Self {
            spec,
            layout,
            params,
        })
    }

    /// All-zero weights, handy to hand-craft a model through `tensor_mut`.
    pub fn zeros(spec: ModelSpec) -> Result<Self> {
        Self::generate(spec, ConstWeightGen::new(0.0))
    }

    /// Untrained but well-conditioned weights drawn from a seeded generator.
    pub fn random(spec: ModelSpec, seed: u64) -> Result<Self> {
        Self::generate(spec, XavierWeightGen::new(StdRng::seed_from_u64(seed)))
    }

    /// Reads weights from a safetensors file.
    ///
    /// # Arguments
    /// * `path` - The location of the file.
    ///
    /// # Returns
    /// The weights or an error if the file can't be read or doesn't describe a valid model.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let weights = Self::from_safetensors(&bytes)?;

        info!(
            params = weights.params.len(),
            layers = weights.spec.layers;
            "loaded model weights from {}",
            path.display()
        );

        Ok(weights)
    }

    /// Parses a safetensors buffer. The spec is read from the `inkforge.spec` metadata entry and
    /// every tensor the spec implies must be present as F32 with the expected shape.
    pub fn from_safetensors(bytes: &[u8]) -> Result<Self> {
        let (_, metadata) = SafeTensors::read_metadata(bytes)?;
        let spec_json = metadata
            .metadata()
            .as_ref()
            .and_then(|entries| entries.get(SPEC_KEY))
            .ok_or_else(|| SynthErr::InvalidSpec(format!("missing `{SPEC_KEY}` metadata")))?;

        let spec: ModelSpec = serde_json::from_str(spec_json)?;
        spec.validate()?;

        let tensors = SafeTensors::deserialize(bytes)?;
        let layout = ParameterLayout::new(&spec);
        let mut params = vec![0.0; layout.len()];

        for slot in layout.slots() {
            let view = tensors
                .tensor(&slot.name)
                .map_err(|_| SynthErr::MissingTensor(slot.name.clone()))?;

            if view.dtype() != Dtype::F32 {
                return Err(SynthErr::UnsupportedDtype {
                    name: slot.name.clone(),
                    dtype: format!("{:?}", view.dtype()),
                });
            }

            if view.shape() != slot.shape.as_slice() {
                return Err(SynthErr::SizeMismatch {
                    what: "tensor elements",
                    got: view.shape().iter().product(),
                    expected: slot.range.len(),
                });
            }

            // Stored little-endian; the buffer itself may be unaligned.
            let values: Vec<f32> = bytemuck::pod_collect_to_vec(view.data());
            params[slot.range.clone()].copy_from_slice(&values);
        }

        Ok(Self {
            spec,
            layout,
            params,
        })
    }

    /// Serializes the weights, spec included, to the safetensors format.
    pub fn to_safetensors(&self) -> Result<Vec<u8>> {
        let views = self
            .layout
            .slots()
            .iter()
            .map(|slot| {
                let data: &[u8] = bytemuck::cast_slice(&self.params[slot.range.clone()]);
                let view = TensorView::new(Dtype::F32, slot.shape.clone(), data)?;
                Ok((slot.name.as_str(), view))
            })
            .collect::<Result<Vec<_>>>()?;

        let metadata = HashMap::from([(SPEC_KEY.to_string(), serde_json::to_string(&self.spec)?)]);
        let tensors = views.iter().map(|(name, view)| (*name, view));
        Ok(safetensors::serialize(tensors, &Some(metadata))?)
    }

    /// Writes the weights to `path` in the safetensors format.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_safetensors()?)?;
        Ok(())
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    pub fn layout(&self) -> &ParameterLayout {
        &self.layout
    }

    /// Returns the whole flat buffer.
    pub fn params(&self) -> &[f32] {
        &self.params
    }

    /// Returns the values of the tensor called `name`.
    pub fn tensor(&self, name: &str) -> Result<&[f32]> {
        let slot = self
            .layout
            .slot(name)
            .ok_or_else(|| SynthErr::MissingTensor(name.into()))?;

        Ok(&self.params[slot.range.clone()])
    }

    /// Returns the values of the tensor called `name` for in-place edits.
    pub fn tensor_mut(&mut self, name: &str) -> Result<&mut [f32]> {
        let slot = self
            .layout
            .slot(name)
            .ok_or_else(|| SynthErr::MissingTensor(name.into()))?;

        Ok(&mut self.params[slot.range.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::StrokeNormalization;

    fn spec() -> ModelSpec {
        ModelSpec {
            vocab_size: 6,
            embedding_dim: 3,
            hidden_dim: 4,
            layers: 2,
            attention_components: 2,
            mixture_components: 2,
            alphabet: None,
            normalization: StrokeNormalization {
                mean: [0.1, 0.2],
                std: [1.5, 2.5],
            },
        }
    }

    #[test]
    fn safetensors_keeps_spec_and_values() {
        let weights = ModelWeights::random(spec(), 3).unwrap();
        let bytes = weights.to_safetensors().unwrap();
        let loaded = ModelWeights::from_safetensors(&bytes).unwrap();

        assert_eq!(loaded.spec(), weights.spec());
        assert_eq!(loaded.params(), weights.params());
    }

    #[test]
    fn missing_spec_metadata_is_rejected() {
        let data = [0u8; 8];
        let view = TensorView::new(Dtype::F32, vec![2], &data).unwrap();
        let bytes = safetensors::serialize([("embedding", &view)], &None).unwrap();

        let err = ModelWeights::from_safetensors(&bytes).unwrap_err();
        assert!(matches!(err, SynthErr::InvalidSpec(_)));
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let spec = spec();
        let zeros = vec![0u8; 4 * 5];
        let spec_json = serde_json::to_string(&spec).unwrap();
        let metadata = Some(HashMap::from([(SPEC_KEY.to_string(), spec_json)]));
        let view = TensorView::new(Dtype::F32, vec![5], &zeros).unwrap();
        let bytes = safetensors::serialize([("embedding", &view)], &metadata).unwrap();

        let err = ModelWeights::from_safetensors(&bytes).unwrap_err();
        assert!(matches!(
            err,
            SynthErr::SizeMismatch {
                got: 5,
                expected: 18,
                ..
            }
        ));
    }

    #[test]
    fn tensor_lookup_by_name() {
        let mut weights = ModelWeights::zeros(spec()).unwrap();
        weights.tensor_mut("window.bias").unwrap().fill(2.0);

        assert_eq!(weights.tensor("window.bias").unwrap(), &[2.0; 6]);
        assert!(weights.tensor("nope").is_err());
    }
}
