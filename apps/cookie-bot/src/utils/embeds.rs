use serenity::all::CreateEmbed;

/// Cookie Bot colors used across all bot embeds.
pub struct Colors;

impl Colors {
    pub const COOKIE: u32 = 0xD2691E;
    pub const SUCCESS: u32 = 0x00FF7F;
    pub const ERROR: u32 = 0xFF4444;
}

/// Create a standard cookie-themed embed with default color, footer, and timestamp.
pub fn cookie_embed() -> CreateEmbed {
    base_embed(Colors::COOKIE)
}

/// Create a success-themed embed (green).
pub fn success_embed() -> CreateEmbed {
    base_embed(Colors::SUCCESS)
}

/// Create an error-themed embed (red).
pub fn error_embed() -> CreateEmbed {
    base_embed(Colors::ERROR)
}

fn base_embed(color: u32) -> CreateEmbed {
    CreateEmbed::default()
        .color(color)
        .footer(serenity::all::CreateEmbedFooter::new(
            "\u{1F36A} Cookie Bot \u{1F36A}",
        ))
        .timestamp(serenity::model::Timestamp::now())
}
