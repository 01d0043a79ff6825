/*
 * Colour assistant: colour information and harmonies for a hex, HSL or CMYK
 * value, RGB gradients, preset palettes, and a favourites list kept in the
 * shared configuration.
 */
use crate::app_logic::ui_constants::{COLOR_FAVORITES_SECTION, GROUP_DESIGN_TOOLS};
use crate::core::color_math::{self, Cmyk, Hsl, Rgb};
use crate::core::{ConfigDocument, IconRef, Plugin, ToolContext, ToolError, ToolWidget};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const PLUGIN_NAME: &str = "Color Assistant";

const FAVORITE_ID_PREFIX: &str = "fav-";

#[derive(Parser, Debug)]
#[command(name = "color-assistant", no_binary_name = true)]
#[command(about = "Colour conversions, harmonies, gradients and favourites")]
struct ColorArgs {
    #[command(subcommand)]
    command: ColorCommand,
}

#[derive(Subcommand, Debug)]
enum ColorCommand {
    /// Show a colour in every model together with its harmonies
    Info { hex: String },
    /// Same as info, for a colour given as hue (degrees), saturation and lightness (percent)
    Hsl {
        hue: f64,
        saturation: f64,
        lightness: f64,
    },
    /// Same as info, for a colour given as CMYK percentages
    Cmyk {
        cyan: f64,
        magenta: f64,
        yellow: f64,
        key: f64,
    },
    /// Preset palettes; lists all of them when no name is given
    Palette { name: Option<String> },
    /// Interpolate between two colours
    Gradient {
        from: String,
        to: String,
        #[arg(short, long, default_value_t = 5)]
        steps: usize,
        /// Store the gradient as a favourite
        #[arg(long)]
        save: bool,
        #[arg(long)]
        name: Option<String>,
    },
    /// Manage favourite colours
    Fav {
        #[command(subcommand)]
        action: FavAction,
    },
}

#[derive(Subcommand, Debug)]
enum FavAction {
    Add {
        hex: String,
        #[arg(long)]
        name: Option<String>,
    },
    List,
    Remove { id: String },
}

pub struct PresetPalette {
    pub name: &'static str,
    /* Hex value and optional display name. */
    pub colors: &'static [(&'static str, Option<&'static str>)],
}

pub const PRESET_PALETTES: &[PresetPalette] = &[
    PresetPalette {
        name: "Fluent Design",
        colors: &[
            ("#FFB900", None),
            ("#E74856", None),
            ("#0078D7", None),
            ("#0099BC", None),
            ("#7A7574", None),
            ("#5D5A58", None),
            ("#68768A", None),
            ("#107C10", None),
        ],
    },
    PresetPalette {
        name: "Ant Design",
        colors: &[
            ("#F5222D", None),
            ("#FA541C", None),
            ("#FAAD14", None),
            ("#13C2C2", None),
            ("#52C41A", None),
            ("#1890FF", None),
            ("#2F54EB", None),
            ("#722ED1", None),
        ],
    },
    PresetPalette {
        name: "Material Design",
        colors: &[
            ("#F44336", None),
            ("#E91E63", None),
            ("#9C27B0", None),
            ("#673AB7", None),
            ("#3F51B5", None),
            ("#2196F3", None),
            ("#03A9F4", None),
            ("#00BCD4", None),
        ],
    },
    PresetPalette {
        name: "Traditional",
        colors: &[
            ("#E60000", Some("China Red")),
            ("#FF9900", Some("Glazed Yellow")),
            ("#00479D", Some("Porcelain Blue")),
            ("#336699", Some("Jiandao Blue")),
            ("#D6ECF0", Some("Moon White")),
            ("#4A4266", Some("Dai Ink")),
            ("#FF4C00", Some("Cinnabar")),
            ("#789262", Some("Bamboo Green")),
        ],
    },
];

fn render_palette(palette: &PresetPalette) -> String {
    let mut lines = vec![palette.name.to_string()];
    lines.extend(palette.colors.iter().map(|(hex, name)| match name {
        Some(name) => format!("  {hex}  {name}"),
        None => format!("  {hex}"),
    }));
    lines.join("\n")
}

fn show_palettes(name: Option<&str>) -> Result<String, ToolError> {
    let Some(name) = name else {
        return Ok(PRESET_PALETTES
            .iter()
            .map(render_palette)
            .collect::<Vec<_>>()
            .join("\n\n"));
    };
    PRESET_PALETTES
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
        .map(render_palette)
        .ok_or_else(|| {
            let known: Vec<&str> = PRESET_PALETTES.iter().map(|p| p.name).collect();
            ToolError::InvalidInput(format!(
                "no palette named '{name}' (available: {})",
                known.join(", ")
            ))
        })
}

fn unit_from_percent(label: &str, value: f64) -> Result<f64, ToolError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(ToolError::InvalidInput(format!(
            "{label} must be between 0 and 100, got {value}"
        )));
    }
    Ok(value / 100.0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FavoriteItem {
    Color {
        id: String,
        hex: String,
        name: String,
        timestamp: i64,
    },
    Gradient {
        id: String,
        colors: Vec<String>,
        name: String,
        timestamp: i64,
    },
}

impl FavoriteItem {
    pub fn id(&self) -> &str {
        match self {
            FavoriteItem::Color { id, .. } | FavoriteItem::Gradient { id, .. } => id,
        }
    }

    fn describe(&self) -> String {
        match self {
            FavoriteItem::Color { id, hex, name, .. } => format!("{id}  {hex}  {name}"),
            FavoriteItem::Gradient {
                id, colors, name, ..
            } => format!("{id}  {}  {name}", colors.join(" -> ")),
        }
    }
}

/*
 * Favourites stored under `color_favorites.items`. Entries that do not parse
 * are skipped with a warning and dropped on the next write.
 */
pub fn load_favorites(document: &ConfigDocument) -> Vec<FavoriteItem> {
    let items = document
        .section(COLOR_FAVORITES_SECTION)
        .and_then(|section| section.get("items"))
        .and_then(Value::as_array);
    let Some(items) = items else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<FavoriteItem>(item.clone()) {
            Ok(favorite) => Some(favorite),
            Err(err) => {
                log::warn!("ColorAssistant: Skipping unreadable favourite {item}: {err}");
                None
            }
        })
        .collect()
}

fn store_favorites(document: &mut ConfigDocument, items: &[FavoriteItem]) {
    document.set_section(COLOR_FAVORITES_SECTION, json!({ "items": items }));
}

fn next_favorite_id(items: &[FavoriteItem]) -> String {
    let highest = items
        .iter()
        .filter_map(|item| item.id().strip_prefix(FAVORITE_ID_PREFIX)?.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("{FAVORITE_ID_PREFIX}{}", highest + 1)
}

fn now_timestamp() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

fn parse_color(raw: &str) -> Result<Rgb, ToolError> {
    color_math::parse_hex(raw).map_err(|e| ToolError::InvalidInput(e.to_string()))
}

fn join_hex(colors: &[Rgb]) -> String {
    colors.iter().map(Rgb::to_hex).collect::<Vec<_>>().join(", ")
}

pub fn describe_color(rgb: Rgb) -> String {
    let hsv = color_math::rgb_to_hsv(rgb);
    let hsl = color_math::rgb_to_hsl(rgb);
    let (c, m, y, k) = color_math::rgb_to_cmyk(rgb).percentages();
    let harmony = color_math::harmony(rgb);
    [
        format!("HEX            {}", rgb.to_hex()),
        format!("RGB            {}, {}, {}", rgb.r, rgb.g, rgb.b),
        format!(
            "HSV            {:.0}°, {:.0}%, {:.0}%",
            hsv.h,
            hsv.s * 100.0,
            hsv.v * 100.0
        ),
        format!(
            "HSL            {:.0}°, {:.0}%, {:.0}%",
            hsl.h,
            hsl.s * 100.0,
            hsl.l * 100.0
        ),
        format!("CMYK           {c}%, {m}%, {y}%, {k}%"),
        format!("Text colour    {}", color_math::readable_text_color(rgb).to_hex()),
        format!("Complementary  {}", harmony.complementary.to_hex()),
        format!("Contrast       {}", join_hex(&harmony.contrast)),
        format!("Analogous      {}", join_hex(&harmony.analogous)),
        format!("Split          {}", join_hex(&harmony.split)),
    ]
    .join("\n")
}

pub struct ColorAssistantPlugin;

impl Plugin for ColorAssistantPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn icon(&self) -> IconRef {
        IconRef::Builtin("palette".to_string())
    }

    fn group(&self) -> &str {
        GROUP_DESIGN_TOOLS
    }

    fn description(&self) -> &str {
        "Colour conversions, harmony palettes, gradients and favourites"
    }

    fn theme_color(&self) -> &str {
        "#FFB900"
    }

    fn keywords(&self) -> Vec<String> {
        [
            "ColorPicker",
            "GradientPage",
            "PaletteGridPage",
            "add_favorite",
            "hex",
            "rgb",
            "hsl",
            "cmyk",
            "palette",
        ]
            .iter()
            .map(|k| k.to_string())
            .collect()
    }

    fn create_widget(&self) -> Box<dyn ToolWidget> {
        Box::new(ColorAssistantWidget)
    }
}

pub struct ColorAssistantWidget;

impl ColorAssistantWidget {
    fn add_favorite(ctx: &ToolContext<'_>, make: impl Fn(String) -> FavoriteItem) -> Result<String, ToolError> {
        let mut added_id = String::new();
        ctx.config
            .update(&mut |doc| {
                let mut items = load_favorites(doc);
                let item = make(next_favorite_id(&items));
                added_id = item.id().to_string();
                items.push(item);
                store_favorites(doc, &items);
            })
            .map_err(|e| ToolError::Failed(format!("could not save favourites: {e}")))?;
        Ok(added_id)
    }

    fn run_fav(action: FavAction, ctx: &ToolContext<'_>) -> Result<String, ToolError> {
        match action {
            FavAction::Add { hex, name } => {
                let rgb = parse_color(&hex)?;
                let hex = rgb.to_hex();
                let name = name.unwrap_or_else(|| hex.clone());
                let id = Self::add_favorite(ctx, |id| FavoriteItem::Color {
                    id,
                    hex: hex.clone(),
                    name: name.clone(),
                    timestamp: now_timestamp(),
                })?;
                Ok(format!("Saved {hex} as {id}"))
            }
            FavAction::List => {
                let items = load_favorites(&ctx.config.load());
                if items.is_empty() {
                    return Ok("No favourites yet.".to_string());
                }
                Ok(items
                    .iter()
                    .map(FavoriteItem::describe)
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            FavAction::Remove { id } => {
                let mut removed = false;
                ctx.config
                    .update(&mut |doc| {
                        let mut items = load_favorites(doc);
                        let before = items.len();
                        items.retain(|item| item.id() != id);
                        removed = items.len() != before;
                        store_favorites(doc, &items);
                    })
                    .map_err(|e| ToolError::Failed(format!("could not save favourites: {e}")))?;
                if removed {
                    Ok(format!("Removed {id}"))
                } else {
                    Err(ToolError::InvalidInput(format!("no favourite with id '{id}'")))
                }
            }
        }
    }
}

impl ToolWidget for ColorAssistantWidget {
    fn title(&self) -> String {
        PLUGIN_NAME.to_string()
    }

    fn run(&mut self, args: &[String], ctx: &mut ToolContext<'_>) -> Result<String, ToolError> {
        let parsed = ColorArgs::try_parse_from(args).map_err(|e| ToolError::Usage(e.to_string()))?;
        match parsed.command {
            ColorCommand::Info { hex } => Ok(describe_color(parse_color(&hex)?)),
            ColorCommand::Hsl {
                hue,
                saturation,
                lightness,
            } => {
                let hsl = Hsl {
                    h: hue,
                    s: unit_from_percent("saturation", saturation)?,
                    l: unit_from_percent("lightness", lightness)?,
                };
                Ok(describe_color(color_math::hsl_to_rgb(hsl)))
            }
            ColorCommand::Cmyk {
                cyan,
                magenta,
                yellow,
                key,
            } => {
                let cmyk = Cmyk {
                    c: unit_from_percent("cyan", cyan)?,
                    m: unit_from_percent("magenta", magenta)?,
                    y: unit_from_percent("yellow", yellow)?,
                    k: unit_from_percent("key", key)?,
                };
                Ok(describe_color(color_math::cmyk_to_rgb(cmyk)))
            }
            ColorCommand::Palette { name } => show_palettes(name.as_deref()),
            ColorCommand::Gradient {
                from,
                to,
                steps,
                save,
                name,
            } => {
                if steps < 2 {
                    return Err(ToolError::InvalidInput(
                        "a gradient needs at least 2 steps".to_string(),
                    ));
                }
                let colors = color_math::gradient(parse_color(&from)?, parse_color(&to)?, steps);
                let hex_list: Vec<String> = colors.iter().map(Rgb::to_hex).collect();
                let mut output = hex_list.join("\n");
                if save {
                    let name = name.unwrap_or_else(|| hex_list.join(" -> "));
                    let id = Self::add_favorite(ctx, |id| FavoriteItem::Gradient {
                        id,
                        colors: hex_list.clone(),
                        name: name.clone(),
                        timestamp: now_timestamp(),
                    })?;
                    output.push_str(&format!("\nSaved gradient as {id}"));
                }
                Ok(output)
            }
            ColorCommand::Fav { action } => Self::run_fav(action, ctx),
        }
    }
}
