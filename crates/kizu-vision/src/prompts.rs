//! Prompt construction for the vision backend

/// Build the damage-assessment prompt for one photo slot.
///
/// The backend must answer with a single JSON object matching the
/// `AnalysisResult` wire shape; unknown or unassessable fields may be null.
pub fn build_damage_prompt(angle: &str) -> String {
    format!(
        r#"You are inspecting a vehicle photo taken from the "{angle}" position.

Steps:
1. Verify the photo actually shows the "{angle}" view, in focus and fully framed.
   If it does not, set "imageComplete" to false and explain in "completenessNote".
2. Look for body or interior damage: scratches, dents, cracks, rust, paint damage,
   broken or missing parts.
3. Classify the worst finding as "minor", "moderate" or "severe".
   Use "none" when the view is undamaged.

Answer with JSON only, no prose:
{{
  "hasDamage": true/false,
  "damageType": "short label, empty when undamaged",
  "severity": "none" | "minor" | "moderate" | "severe",
  "description": "what you observed",
  "recommendations": ["repair suggestions, empty when undamaged"],
  "imageComplete": true/false,
  "completenessNote": null or "why verification failed"
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_the_angle_and_contract_fields() {
        let prompt = build_damage_prompt("Left Side");
        assert!(prompt.contains("\"Left Side\""));
        for key in [
            "hasDamage",
            "damageType",
            "severity",
            "description",
            "recommendations",
            "imageComplete",
            "completenessNote",
        ] {
            assert!(prompt.contains(key), "prompt should mention {key}");
        }
    }
}
