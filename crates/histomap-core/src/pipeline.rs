//! # Map Pipeline
//!
//! One render pass: join, then render. All inputs are explicit parameters;
//! nothing is read from process state, so equal inputs give equal output.

use crate::join::{JoinedView, join};
use crate::render::{Figure, RenderOptions, render};
use crate::sources::{ClassificationTable, StageLegend};
use crate::{CountryRecord, HistomapError, Language};

/// Borrowed inputs of a render pass.
#[derive(Debug, Clone, Copy)]
pub struct MapInputs<'a> {
    pub countries: &'a [CountryRecord],
    pub classifications: &'a ClassificationTable,
    pub legend: &'a StageLegend,
}

/// Result of a render pass: the joined view it drew and the figure.
#[derive(Debug, Clone)]
pub struct MapOutput {
    pub view: JoinedView,
    pub figure: Figure,
}

/// Join the inputs and render them in `language`.
pub fn build_map(
    inputs: MapInputs<'_>,
    language: Language,
    options: &RenderOptions,
) -> Result<MapOutput, HistomapError> {
    let view = join(inputs.countries, inputs.classifications, inputs.legend);
    let figure = render(&view, inputs.legend, language, options)?;
    Ok(MapOutput { view, figure })
}
