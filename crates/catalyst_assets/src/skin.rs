use glam::Mat4;

use crate::{
    accessor::AccessorReader,
    document::{AccessorType, SkinData},
    error::AssetError,
};

/// Joint node indices and their inverse bind matrices, index aligned.
#[derive(Clone, Debug)]
pub struct SceneSkin {
    pub name: String,
    pub index: usize,
    pub joints: Vec<usize>,
    pub inverse_bind_matrices: Vec<Mat4>,
    pub skeleton: Option<usize>,
}

pub fn build_skin(
    reader: &AccessorReader<'_>,
    index: usize,
    data: &SkinData,
) -> Result<SceneSkin, AssetError> {
    let inverse_bind_matrices = match data.inverse_bind_matrices {
        Some(accessor) => {
            let floats = reader.read_typed_floats(accessor, AccessorType::Mat4, "inverse bind matrices")?;
            let matrices: Vec<Mat4> = floats
                .chunks_exact(16)
                .map(Mat4::from_cols_slice)
                .collect();
            if matrices.len() < data.joints.len() {
                return Err(AssetError::MissingInverseBindMatrices {
                    skin: index,
                    joints: data.joints.len(),
                    matrices: matrices.len(),
                });
            }
            matrices
        }
        None => vec![Mat4::IDENTITY; data.joints.len()],
    };

    Ok(SceneSkin {
        name: data.name.clone().unwrap_or_else(|| format!("skin{index}")),
        index,
        joints: data.joints.clone(),
        inverse_bind_matrices,
        skeleton: data.skeleton,
    })
}
