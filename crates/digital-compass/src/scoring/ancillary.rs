use super::keyed::Keyed;
use crate::pipeline::tables::{DefinitionRow, PillarDefinitionRow};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PillarColors {
    pub base: String,
    pub triple: [String; 3],
}

impl From<&PillarDefinitionRow> for PillarColors {
    fn from(row: &PillarDefinitionRow) -> Self {
        Self {
            base: row.color_base.clone(),
            triple: [
                row.color_triple_1.clone(),
                row.color_triple_2.clone(),
                row.color_triple_3.clone(),
            ],
        }
    }
}

/// Label, ordering and color lookups for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AncillaryMetadata {
    pub pillars: Keyed<Vec<String>>,
    pub pillar_names: Vec<String>,
    pub pillar_color_map: Keyed<PillarColors>,
    pub digital_right_pillar_name: Vec<String>,
    pub digital_right_pillar_color_map: Keyed<PillarColors>,
    pub digital_right_pillars: Keyed<Vec<String>>,
}

impl AncillaryMetadata {
    pub fn emit(
        pillar_definitions: &[PillarDefinitionRow],
        digital_right_pillar_definitions: &[PillarDefinitionRow],
        definitions: &[DefinitionRow],
        digital_right_definitions: &[DefinitionRow],
    ) -> Self {
        let pillar_names = distinct_pillars(pillar_definitions);
        let digital_right_pillar_name = distinct_pillars(digital_right_pillar_definitions);

        Self {
            pillars: sub_pillar_map(&pillar_names, definitions),
            pillar_color_map: color_map(pillar_definitions),
            digital_right_pillar_color_map: color_map(digital_right_pillar_definitions),
            digital_right_pillars: sub_pillar_map(
                &digital_right_pillar_name,
                digital_right_definitions,
            ),
            pillar_names,
            digital_right_pillar_name,
        }
    }
}

fn distinct_pillars(rows: &[PillarDefinitionRow]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(rows.len());
    for row in rows {
        if !names.contains(&row.pillar) {
            names.push(row.pillar.clone());
        }
    }
    names
}

fn sub_pillar_map(pillars: &[String], definitions: &[DefinitionRow]) -> Keyed<Vec<String>> {
    pillars
        .iter()
        .map(|pillar| {
            let mut sub_pillars: Vec<String> = Vec::new();
            for row in definitions.iter().filter(|row| &row.pillar == pillar) {
                if !row.sub_pillar.is_empty() && !sub_pillars.contains(&row.sub_pillar) {
                    sub_pillars.push(row.sub_pillar.clone());
                }
            }
            (pillar.clone(), sub_pillars)
        })
        .collect()
}

fn color_map(rows: &[PillarDefinitionRow]) -> Keyed<PillarColors> {
    rows.iter()
        .map(|row| (row.pillar.clone(), PillarColors::from(row)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pillar(name: &str, base: &str) -> PillarDefinitionRow {
        PillarDefinitionRow {
            pillar: name.to_string(),
            color_base: base.to_string(),
            color_triple_1: "#FFF".to_string(),
            color_triple_2: "#a2e0f5".to_string(),
            color_triple_3: base.to_string(),
        }
    }

    fn definition(pillar: &str, sub_pillar: &str) -> DefinitionRow {
        DefinitionRow {
            pillar: pillar.to_string(),
            sub_pillar: sub_pillar.to_string(),
            ..DefinitionRow::default()
        }
    }

    #[test]
    fn emits_ordered_pillars_with_deduplicated_sub_pillars() {
        let pillar_definitions = vec![
            pillar("Overall", "#6366f1"),
            pillar("Economy", "#DE1568"),
            pillar("Government", "#FDB710"),
            pillar("Economy", "#000000"),
        ];
        let definitions = vec![
            definition("Economy", ""),
            definition("Economy", "Financial services"),
            definition("Economy", "Trade"),
            definition("Economy", "Financial services"),
            definition("Government", "Capabilities"),
            definition("Strategy", "Ambition"),
        ];

        let metadata = AncillaryMetadata::emit(&pillar_definitions, &[], &definitions, &[]);

        assert_eq!(metadata.pillar_names, vec!["Overall", "Economy", "Government"]);
        assert_eq!(
            metadata.pillars.get("Economy"),
            Some(&vec!["Financial services".to_string(), "Trade".to_string()])
        );
        assert_eq!(metadata.pillars.get("Overall"), Some(&Vec::new()));
        assert!(metadata.pillars.get("Strategy").is_none());

        let economy = metadata.pillar_color_map.get("Economy").expect("economy colors");
        assert_eq!(economy.base, "#DE1568");
        assert_eq!(economy.triple, ["#FFF", "#a2e0f5", "#DE1568"].map(String::from));
    }

    #[test]
    fn digital_right_names_follow_their_own_table() {
        let digital_right_definitions = vec![pillar("Privacy", "#111111"), pillar("Speech", "#222222")];
        let metadata = AncillaryMetadata::emit(&[], &digital_right_definitions, &[], &[]);

        assert_eq!(metadata.digital_right_pillar_name, vec!["Privacy", "Speech"]);
        assert!(metadata.digital_right_pillar_color_map.contains_key("Speech"));
        assert_eq!(metadata.digital_right_pillars.get("Privacy"), Some(&Vec::new()));
    }

    #[test]
    fn serializes_with_presentation_field_names() {
        let metadata = AncillaryMetadata::emit(&[pillar("Economy", "#DE1568")], &[], &[], &[]);
        let json = serde_json::to_value(&metadata).expect("serialize");

        assert!(json.get("pillarNames").is_some());
        assert!(json.get("pillarColorMap").is_some());
        assert!(json.get("digitalRightPillarName").is_some());
        assert!(json.get("digitalRightPillarColorMap").is_some());
        assert_eq!(json["pillarColorMap"]["Economy"]["triple"][2], "#DE1568");
    }
}
