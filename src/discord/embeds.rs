// Embed and message formatting shared by every command.

use poise::serenity_prelude as serenity;

pub const RED: u32 = 0xE74C3C;
pub const GREEN: u32 = 0x2ECC71;

/// Discord's per-message content limit.
pub const MESSAGE_LIMIT: usize = 2000;
/// Discord's per-field value limit.
pub const FIELD_LIMIT: usize = 1024;

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: truncate(&value.into(), FIELD_LIMIT),
            inline: false,
        }
    }

    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }
}

/// Builds an embed with the house defaults (red unless told otherwise).
pub fn create_embed(
    title: &str,
    description: &str,
    color: Option<u32>,
    url: Option<&str>,
    thumbnail_url: Option<&str>,
    fields: &[Field],
) -> serenity::CreateEmbed {
    let mut embed = serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(color.unwrap_or(RED));

    if let Some(url) = url {
        embed = embed.url(url);
    }
    if let Some(thumbnail_url) = thumbnail_url {
        embed = embed.thumbnail(thumbnail_url);
    }

    for field in fields {
        embed = embed.field(&field.name, &field.value, field.inline);
    }

    embed
}

/// Cuts `text` to at most `limit` characters, marking the cut with `...`.
pub fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let mut cut: String = text.chars().take(limit.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

/// Splits long text into message-sized chunks.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    text.chars()
        .collect::<Vec<char>>()
        .chunks(limit.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_embed_defaults_to_red() {
        let embed = create_embed("Title", "Body", None, None, None, &[]);
        let json = serde_json::to_value(&embed).unwrap();

        assert_eq!(json["title"], "Title");
        assert_eq!(json["description"], "Body");
        assert_eq!(json["color"], RED);
        assert!(json.get("url").is_none());
    }

    #[test]
    fn test_create_embed_with_everything() {
        let fields = [
            Field::new("Model", "gpt-4o-mini").inline(),
            Field::new("Tokens", "12"),
        ];
        let embed = create_embed(
            "ChatGPT",
            "question",
            Some(GREEN),
            Some("https://example.com"),
            Some("https://example.com/thumb.png"),
            &fields,
        );
        let json = serde_json::to_value(&embed).unwrap();

        assert_eq!(json["color"], GREEN);
        assert_eq!(json["url"], "https://example.com");
        assert_eq!(json["thumbnail"]["url"], "https://example.com/thumb.png");
        assert_eq!(json["fields"][0]["name"], "Model");
        assert_eq!(json["fields"][0]["inline"], true);
        assert_eq!(json["fields"][1]["value"], "12");
        assert_eq!(json["fields"][1]["inline"], false);
    }

    #[test]
    fn test_field_value_is_truncated() {
        let field = Field::new("Error info", "x".repeat(FIELD_LIMIT + 50));
        assert_eq!(field.value.chars().count(), FIELD_LIMIT);
        assert!(field.value.ends_with("..."));
    }

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn test_split_message() {
        let text = "é".repeat(4500);
        let chunks = split_message(&text, MESSAGE_LIMIT);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 2000);
        assert_eq!(chunks[2].chars().count(), 500);
        assert!(split_message("", MESSAGE_LIMIT).is_empty());
    }
}
