use serde::{Deserialize, Deserializer, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Navigate,
    Composing,
    InlineEdit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Quadrant {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quadrant {
    pub fn all() -> [Quadrant; 4] {
        [Quadrant::Q1, Quadrant::Q2, Quadrant::Q3, Quadrant::Q4]
    }

    pub fn code(&self) -> &'static str {
        match self {
            Quadrant::Q1 => "Q1",
            Quadrant::Q2 => "Q2",
            Quadrant::Q3 => "Q3",
            Quadrant::Q4 => "Q4",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quadrant::Q1 => "Urgent & Important",
            Quadrant::Q2 => "Not Urgent & Important",
            Quadrant::Q3 => "Urgent & Not Important",
            Quadrant::Q4 => "Not Urgent & Not Important",
        }
    }

    pub fn from_code(code: &str) -> Option<Quadrant> {
        match code.trim().to_ascii_uppercase().as_str() {
            "Q1" => Some(Quadrant::Q1),
            "Q2" => Some(Quadrant::Q2),
            "Q3" => Some(Quadrant::Q3),
            "Q4" => Some(Quadrant::Q4),
            _ => None,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Quadrant::Q1 => 0,
            Quadrant::Q2 => 1,
            Quadrant::Q3 => 2,
            Quadrant::Q4 => 3,
        }
    }

    /// Grid neighbour in the 2x2 layout (Q1 Q2 / Q3 Q4).
    pub fn neighbour(&self, direction: Direction) -> Quadrant {
        match (self, direction) {
            (Quadrant::Q1, Direction::Right) => Quadrant::Q2,
            (Quadrant::Q1, Direction::Down) => Quadrant::Q3,
            (Quadrant::Q2, Direction::Left) => Quadrant::Q1,
            (Quadrant::Q2, Direction::Down) => Quadrant::Q4,
            (Quadrant::Q3, Direction::Right) => Quadrant::Q4,
            (Quadrant::Q3, Direction::Up) => Quadrant::Q1,
            (Quadrant::Q4, Direction::Left) => Quadrant::Q3,
            (Quadrant::Q4, Direction::Up) => Quadrant::Q2,
            (quadrant, _) => *quadrant,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, deserialize_with = "lenient_quadrant")]
    pub quadrant: Option<Quadrant>,
    #[serde(default)]
    pub urgency: Option<u8>,
    #[serde(default)]
    pub importance: Option<u8>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            completed: false,
            quadrant: None,
            urgency: None,
            importance: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn in_quadrant(mut self, quadrant: Quadrant) -> Self {
        self.quadrant = Some(quadrant);
        self
    }
}

// Unknown or null quadrant codes mean "not sorted yet".
fn lenient_quadrant<'de, D>(deserializer: D) -> Result<Option<Quadrant>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Quadrant::from_code))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}
