//! Built-in catalog of image style modifiers.

/// Identifier of the "no style" entry.
pub const NO_STYLE_ID: &str = "none";

/// A predefined prompt fragment that biases generated-image aesthetics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleModifier {
    pub id: &'static str,
    pub display_name: &'static str,
    pub prompt_fragment: &'static str,
    pub preview: &'static str,
}

impl StyleModifier {
    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.prompt_fragment.is_empty()
    }

    /// Appends this style's fragment to `prompt`, separated by `", "`.
    /// An empty fragment leaves the prompt unchanged.
    #[must_use]
    pub fn apply(&self, prompt: &str) -> String {
        if self.is_none() {
            prompt.to_string()
        } else {
            format!("{prompt}, {}", self.prompt_fragment)
        }
    }
}

pub const STYLES: &[StyleModifier] = &[
    StyleModifier {
        id: NO_STYLE_ID,
        display_name: "No Style",
        prompt_fragment: "",
        preview: "🎨",
    },
    StyleModifier {
        id: "photorealistic",
        display_name: "Photorealistic",
        prompt_fragment: "photorealistic, ultra HD, 8K resolution, highly detailed, professional photography",
        preview: "📷",
    },
    StyleModifier {
        id: "anime",
        display_name: "Anime",
        prompt_fragment: "anime style, manga art, vibrant colors, Japanese animation aesthetic",
        preview: "🎌",
    },
    StyleModifier {
        id: "watercolor",
        display_name: "Watercolor",
        prompt_fragment: "watercolor painting, soft edges, flowing colors, artistic brushstrokes",
        preview: "🖌️",
    },
    StyleModifier {
        id: "oil-painting",
        display_name: "Oil Painting",
        prompt_fragment: "oil painting style, rich textures, classical art, museum quality",
        preview: "🖼️",
    },
    StyleModifier {
        id: "digital-art",
        display_name: "Digital Art",
        prompt_fragment: "digital art, concept art, vibrant, modern illustration style",
        preview: "💻",
    },
    StyleModifier {
        id: "3d-render",
        display_name: "3D Render",
        prompt_fragment: "3D rendered, CGI, octane render, highly detailed textures, realistic lighting",
        preview: "🎮",
    },
    StyleModifier {
        id: "sketch",
        display_name: "Pencil Sketch",
        prompt_fragment: "pencil sketch, hand-drawn, detailed line art, graphite drawing",
        preview: "✏️",
    },
    StyleModifier {
        id: "fantasy",
        display_name: "Fantasy Art",
        prompt_fragment: "fantasy art style, magical, ethereal lighting, epic fantasy illustration",
        preview: "🧙",
    },
    StyleModifier {
        id: "cyberpunk",
        display_name: "Cyberpunk",
        prompt_fragment: "cyberpunk style, neon lights, futuristic, high-tech low-life aesthetic",
        preview: "🌃",
    },
    StyleModifier {
        id: "vintage",
        display_name: "Vintage",
        prompt_fragment: "vintage style, retro aesthetic, aged look, nostalgic film grain",
        preview: "📜",
    },
    StyleModifier {
        id: "minimalist",
        display_name: "Minimalist",
        prompt_fragment: "minimalist style, clean lines, simple shapes, modern design",
        preview: "⬜",
    },
];

#[must_use]
pub fn style_by_id(id: &str) -> Option<&'static StyleModifier> {
    STYLES.iter().find(|s| s.id.eq_ignore_ascii_case(id.trim()))
}
