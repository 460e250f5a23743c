use super::stage::{StageLevel, StageName};
use super::Stage;
use crate::pipeline::tables::DefinitionRow;

/// Position of the definition row for a pillar and optional sub-pillar.
/// `None` and `""` both select the pillar-level row (empty sub-pillar).
///
/// Positions index the typed rows and the published rows of a table alike.
pub fn find_definition(
    definitions: &[DefinitionRow],
    pillar: &str,
    sub_pillar: Option<&str>,
) -> Option<usize> {
    let sub_pillar = sub_pillar.unwrap_or_default();
    definitions
        .iter()
        .position(|row| row.pillar == pillar && row.sub_pillar == sub_pillar)
}

/// Position of the first definition row for a pillar, ignoring sub-pillars.
pub fn find_pillar_definition(definitions: &[DefinitionRow], pillar: &str) -> Option<usize> {
    definitions.iter().position(|row| row.pillar == pillar)
}

/// Stage description text; empty when no row matches or the cell is blank.
pub fn describe(
    definitions: &[DefinitionRow],
    pillar: &str,
    sub_pillar: Option<&str>,
    stage: StageName,
) -> String {
    find_definition(definitions, pillar, sub_pillar)
        .and_then(|index| definitions.get(index))
        .map(|row| row.text_for(stage).to_string())
        .unwrap_or_default()
}

pub fn describe_pillar(definitions: &[DefinitionRow], pillar: &str, stage: StageName) -> String {
    find_pillar_definition(definitions, pillar)
        .and_then(|index| definitions.get(index))
        .map(|row| row.text_for(stage).to_string())
        .unwrap_or_default()
}

pub(crate) fn stage_for(
    level: Option<StageLevel>,
    definitions: &[DefinitionRow],
    pillar: &str,
    sub_pillar: Option<&str>,
) -> Option<Stage> {
    level.map(|level| {
        level.with_description(describe(definitions, pillar, sub_pillar, level.name))
    })
}
