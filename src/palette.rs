// Default colour sequences used by the plot primitives

/// Plotly's default qualitative sequence
pub const DEFAULT_SEQUENCE: [&str; 10] = [
    "#636efa", "#EF553B", "#00cc96", "#ab63fa", "#FFA15A",
    "#19d3f3", "#FF6692", "#B6E880", "#FF97FF", "#FECB52",
];

/// Colour used for axis and legend borders
pub const BORDER_COLOR: &str = "#06476a";

/// Cycles through a discrete colour sequence
#[derive(Debug, Clone)]
pub struct ColorPalette {
    colors: Vec<String>,
}

impl ColorPalette {
    pub fn new(colors: Vec<String>) -> Self {
        if colors.is_empty() {
            return Self::default();
        }
        Self { colors }
    }

    pub fn get(&self, index: usize) -> &str {
        &self.colors[index % self.colors.len()]
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_SEQUENCE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_cycles() {
        let palette = ColorPalette::default();
        assert_eq!(palette.get(0), "#636efa");
        assert_eq!(palette.get(10), "#636efa");
        assert_eq!(palette.get(11), "#EF553B");
    }

    #[test]
    fn test_empty_palette_falls_back() {
        let palette = ColorPalette::new(vec![]);
        assert_eq!(palette.get(2), "#00cc96");
    }
}
