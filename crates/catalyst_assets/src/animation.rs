//! Keyframe tracks and the samplers built from document animations.

use std::{collections::HashMap, str::FromStr, sync::Arc};

use glam::{Quat, Vec3, Vec4};

use crate::{
    accessor::AccessorReader,
    document::{AccessorType, AnimationData, AnimationSamplerData},
    error::AssetError,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    Linear,
    CubicSpline,
}

impl FromStr for Interpolation {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STEP" => Ok(Self::Step),
            "LINEAR" => Ok(Self::Linear),
            "CUBICSPLINE" => Ok(Self::CubicSpline),
            other => Err(AssetError::UnknownInterpolation(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationPath {
    Translation,
    Rotation,
    Scale,
    Weights,
}

impl FromStr for AnimationPath {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "translation" => Ok(Self::Translation),
            "rotation" => Ok(Self::Rotation),
            "scale" => Ok(Self::Scale),
            "weights" => Ok(Self::Weights),
            other => Err(AssetError::UnknownTargetPath(other.to_string())),
        }
    }
}

impl AnimationPath {
    fn output_type(self) -> AccessorType {
        match self {
            Self::Translation | Self::Scale => AccessorType::Vec3,
            Self::Rotation => AccessorType::Vec4,
            Self::Weights => AccessorType::Scalar,
        }
    }
}

/// Values a keyframe track can blend between.
pub trait Interpolate: Copy {
    fn lerp_to(self, other: Self, t: f32) -> Self;

    /// Cubic Hermite segment from `p0` to `p1` with tangents already scaled
    /// by the keyframe interval.
    fn hermite(p0: Self, m0: Self, m1: Self, p1: Self, t: f32) -> Self;

    fn scaled(self, factor: f32) -> Self;
}

fn hermite_basis(t: f32) -> [f32; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        2.0 * t3 - 3.0 * t2 + 1.0,
        t3 - 2.0 * t2 + t,
        -2.0 * t3 + 3.0 * t2,
        t3 - t2,
    ]
}

impl Interpolate for f32 {
    fn lerp_to(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }

    fn hermite(p0: Self, m0: Self, m1: Self, p1: Self, t: f32) -> Self {
        let [h00, h10, h01, h11] = hermite_basis(t);
        h00 * p0 + h10 * m0 + h01 * p1 + h11 * m1
    }

    fn scaled(self, factor: f32) -> Self {
        self * factor
    }
}

impl Interpolate for Vec3 {
    fn lerp_to(self, other: Self, t: f32) -> Self {
        self.lerp(other, t)
    }

    fn hermite(p0: Self, m0: Self, m1: Self, p1: Self, t: f32) -> Self {
        let [h00, h10, h01, h11] = hermite_basis(t);
        p0 * h00 + m0 * h10 + p1 * h01 + m1 * h11
    }

    fn scaled(self, factor: f32) -> Self {
        self * factor
    }
}

impl Interpolate for Quat {
    fn lerp_to(self, other: Self, t: f32) -> Self {
        self.slerp(other, t)
    }

    fn hermite(p0: Self, m0: Self, m1: Self, p1: Self, t: f32) -> Self {
        let [h00, h10, h01, h11] = hermite_basis(t);
        let v = Vec4::from(p0) * h00 + Vec4::from(m0) * h10 + Vec4::from(p1) * h01 + Vec4::from(m1) * h11;
        Quat::from_vec4(v).normalize()
    }

    fn scaled(self, factor: f32) -> Self {
        Quat::from_vec4(Vec4::from(self) * factor)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe<T> {
    pub time: f32,
    pub value: T,
    /// Only meaningful for cubic spline tracks.
    pub in_tangent: T,
    pub out_tangent: T,
}

/// Time sorted keyframes of one value type.
#[derive(Clone, Debug)]
pub struct KeyframeTrack<T> {
    keys: Vec<Keyframe<T>>,
    interpolation: Interpolation,
    max_time: f32,
}

impl<T: Interpolate> KeyframeTrack<T> {
    /// `values` holds one value per time, or an `(in, value, out)` triple per
    /// time for cubic splines.
    pub fn new(times: &[f32], values: &[T], interpolation: Interpolation) -> Result<Self, AssetError> {
        let per_key = if interpolation == Interpolation::CubicSpline { 3 } else { 1 };
        if times.is_empty() || values.len() != times.len() * per_key {
            return Err(AssetError::KeyframeCountMismatch {
                inputs: times.len(),
                outputs: values.len(),
            });
        }

        let mut keys: Vec<Keyframe<T>> = times
            .iter()
            .zip(values.chunks_exact(per_key))
            .map(|(&time, chunk)| match chunk {
                [in_tangent, value, out_tangent] => Keyframe {
                    time,
                    value: *value,
                    in_tangent: *in_tangent,
                    out_tangent: *out_tangent,
                },
                _ => Keyframe {
                    time,
                    value: chunk[0],
                    in_tangent: chunk[0],
                    out_tangent: chunk[0],
                },
            })
            .collect();
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        let max_time = keys.last().map_or(0.0, |key| key.time);

        Ok(Self {
            keys,
            interpolation,
            max_time,
        })
    }

    pub fn keys(&self) -> &[Keyframe<T>] {
        &self.keys
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn max_time(&self) -> f32 {
        self.max_time
    }

    /// Samples the track. Times before the first key clamp to it, times past
    /// the last key clamp to the last.
    pub fn value_at(&self, time: f32) -> T {
        let last = self.keys.len() - 1;
        let floor = self.keys.partition_point(|key| key.time <= time).saturating_sub(1);
        let ceil = self.keys.partition_point(|key| key.time < time).min(last);
        let (floor_key, ceil_key) = (&self.keys[floor], &self.keys[ceil]);

        if self.interpolation == Interpolation::Step {
            return floor_key.value;
        }
        let interval = ceil_key.time - floor_key.time;
        if interval <= 0.0 {
            return ceil_key.value;
        }
        let alpha = (time - floor_key.time) / interval;

        match self.interpolation {
            Interpolation::CubicSpline => T::hermite(
                floor_key.value,
                floor_key.out_tangent.scaled(interval),
                ceil_key.in_tangent.scaled(interval),
                ceil_key.value,
                alpha,
            ),
            _ => floor_key.value.lerp_to(ceil_key.value, alpha),
        }
    }
}

/// Value produced by sampling an [`AnimationSampler`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SampledValue {
    Translation(Vec3),
    Rotation(Quat),
    Scale(Vec3),
    Weight(f32),
}

/// A keyframe track bound to the node property it drives.
#[derive(Clone, Debug)]
pub enum AnimationSampler {
    Translation(KeyframeTrack<Vec3>),
    Rotation(KeyframeTrack<Quat>),
    Scale(KeyframeTrack<Vec3>),
    Weights(KeyframeTrack<f32>),
}

impl AnimationSampler {
    pub fn path(&self) -> AnimationPath {
        match self {
            Self::Translation(_) => AnimationPath::Translation,
            Self::Rotation(_) => AnimationPath::Rotation,
            Self::Scale(_) => AnimationPath::Scale,
            Self::Weights(_) => AnimationPath::Weights,
        }
    }

    pub fn max_time(&self) -> f32 {
        match self {
            Self::Translation(track) | Self::Scale(track) => track.max_time(),
            Self::Rotation(track) => track.max_time(),
            Self::Weights(track) => track.max_time(),
        }
    }

    pub fn sample(&self, time: f32) -> SampledValue {
        match self {
            Self::Translation(track) => SampledValue::Translation(track.value_at(time)),
            Self::Rotation(track) => SampledValue::Rotation(track.value_at(time)),
            Self::Scale(track) => SampledValue::Scale(track.value_at(time)),
            Self::Weights(track) => SampledValue::Weight(track.value_at(time)),
        }
    }
}

/// One sampler of a named animation targeting a node.
#[derive(Clone, Debug)]
pub struct NodeSamplerBinding {
    pub animation: String,
    pub sampler: Arc<AnimationSampler>,
}

/// Samplers grouped by the document index of the node they drive. Only
/// consulted while scene graphs are built.
#[derive(Clone, Debug, Default)]
pub struct SceneAnimationData {
    pub by_node: HashMap<usize, Vec<NodeSamplerBinding>>,
    /// Animation names in document order.
    pub names: Vec<String>,
}

impl SceneAnimationData {
    pub fn for_node(&self, node: usize) -> &[NodeSamplerBinding] {
        self.by_node.get(&node).map_or(&[], Vec::as_slice)
    }
}

/// Decoded float arrays keyed by accessor index, so channels sharing an
/// accessor decode it once.
struct FloatCache<'r, 'a> {
    reader: &'r AccessorReader<'a>,
    decoded: HashMap<usize, Arc<[f32]>>,
}

impl FloatCache<'_, '_> {
    fn get(&mut self, accessor: usize, expected: AccessorType, usage: &'static str) -> Result<Arc<[f32]>, AssetError> {
        let found = self.reader.accessor(accessor).kind;
        if found != expected {
            return Err(AssetError::AccessorTypeMismatch {
                accessor,
                usage,
                expected,
                found,
            });
        }
        if let Some(floats) = self.decoded.get(&accessor) {
            return Ok(floats.clone());
        }
        let floats: Arc<[f32]> = self.reader.read_typed_floats(accessor, expected, usage)?.into();
        self.decoded.insert(accessor, floats.clone());
        Ok(floats)
    }
}

pub fn build_animation_data(
    reader: &AccessorReader<'_>,
    animations: &[AnimationData],
) -> Result<SceneAnimationData, AssetError> {
    let mut data = SceneAnimationData::default();
    let mut cache = FloatCache {
        reader,
        decoded: HashMap::new(),
    };

    for (a, animation) in animations.iter().enumerate() {
        let name = animation.name.clone().unwrap_or_else(|| format!("animation{a}"));
        for channel in &animation.channels {
            let Some(node) = channel.target.node else {
                log::debug!("animation {name}: channel without a target node skipped");
                continue;
            };
            let path: AnimationPath = channel.target.path.parse()?;
            let sampler = build_sampler(&mut cache, &animation.samplers[channel.sampler], path)?;
            data.by_node.entry(node).or_default().push(NodeSamplerBinding {
                animation: name.clone(),
                sampler: Arc::new(sampler),
            });
        }
        log::debug!("animation {name}: {} channels", animation.channels.len());
        data.names.push(name);
    }

    Ok(data)
}

fn build_sampler(
    cache: &mut FloatCache<'_, '_>,
    data: &AnimationSamplerData,
    path: AnimationPath,
) -> Result<AnimationSampler, AssetError> {
    let interpolation: Interpolation = data.interpolation.parse()?;
    let times = cache.get(data.input, AccessorType::Scalar, "keyframe times")?;
    let values = cache.get(data.output, path.output_type(), "keyframe values")?;

    Ok(match path {
        AnimationPath::Translation => AnimationSampler::Translation(KeyframeTrack::new(
            &times,
            &values.chunks_exact(3).map(Vec3::from_slice).collect::<Vec<_>>(),
            interpolation,
        )?),
        AnimationPath::Scale => AnimationSampler::Scale(KeyframeTrack::new(
            &times,
            &values.chunks_exact(3).map(Vec3::from_slice).collect::<Vec<_>>(),
            interpolation,
        )?),
        AnimationPath::Rotation => AnimationSampler::Rotation(KeyframeTrack::new(
            &times,
            &values.chunks_exact(4).map(Quat::from_slice).collect::<Vec<_>>(),
            interpolation,
        )?),
        AnimationPath::Weights => {
            // One value per morph target per key; only the first target is kept.
            let per_key = if interpolation == Interpolation::CubicSpline { 3 } else { 1 };
            let targets = values.len() / (times.len() * per_key).max(1);
            let firsts: Vec<f32> = values.iter().step_by(targets.max(1)).copied().collect();
            AnimationSampler::Weights(KeyframeTrack::new(&times, &firsts, interpolation)?)
        }
    })
}
