/// Fixed system instruction sent with every completion request
pub const SYSTEM_INSTRUCTION: &str = "You are a professional tour guide with extensive knowledge of \
global tourist destinations. You MUST respond with raw JSON only, no markdown formatting or \
explanations.";

/// Builds the location-specific prompt asking for exactly five places
pub fn build_prompt(location: &str) -> String {
    format!(
        r#"Act as a professional tour guide for {location}.
Provide exactly 5 must-visit tourist attractions or emblematic places in this area.

For each place, include:
1. Name of the place (be specific and accurate with the official name)
2. A brief description (2-3 sentences)
3. Address or location (be as specific and accurate as possible with the full address)
4. Recommended time to spend there
5. A helpful tip for visitors

Format your response as a JSON object with a "recommendations" array, each entry shaped like:
{{
  "name": "Place name",
  "description": "Brief description",
  "address": "Address or location",
  "recommendedTime": "e.g., 1-2 hours",
  "tips": "A helpful tip"
}}

IMPORTANT: Return ONLY the raw JSON without any markdown formatting, code blocks, or additional text."#
    )
}
