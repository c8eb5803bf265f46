use serde::{Deserialize, Serialize};

/// 转换模式
///
/// 每个模式决定重写引擎使用哪套规则表和模板。
/// `translate` 等无关的工具命令不属于本核心，不在此枚举中。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// 普通落地页转换
    Landing,
    /// 预落地页转换
    Prelanding,
    /// 带闸门的落地页转换
    ProklaLand,
    /// 只处理表单的落地页转换
    LandForm,
    /// 落地页转预落地页（带闸门）
    LandToPreland,
    /// 只替换 order.php
    EditOrder,
}

impl Mode {
    /// 从命令文本解析模式
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "landing" => Some(Mode::Landing),
            "prelanding" => Some(Mode::Prelanding),
            "prokla_land" => Some(Mode::ProklaLand),
            "land_form" => Some(Mode::LandForm),
            "land_to_preland" => Some(Mode::LandToPreland),
            "edit_order" => Some(Mode::EditOrder),
            _ => None,
        }
    }

    /// 输出文件名前缀
    pub fn prefix(&self) -> &'static str {
        match self {
            Mode::Landing => "Land",
            Mode::Prelanding => "Preland",
            Mode::ProklaLand => "Proklaland",
            Mode::LandForm | Mode::LandToPreland | Mode::EditOrder => "Result",
        }
    }

    /// 是否属于落地页家族（重命名 index、重建 order.php / form-scripts.js）
    pub fn is_landing_family(&self) -> bool {
        matches!(self, Mode::Landing | Mode::ProklaLand | Mode::LandForm)
    }

    /// 是否属于预落地页家族
    pub fn is_prelanding_family(&self) -> bool {
        matches!(self, Mode::Prelanding | Mode::LandToPreland)
    }

    /// 是否要求参数第一行严格为闸门 key=value
    pub fn requires_gate(&self) -> bool {
        matches!(self, Mode::ProklaLand | Mode::LandToPreland)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Mode::Landing => "landing",
            Mode::Prelanding => "prelanding",
            Mode::ProklaLand => "prokla_land",
            Mode::LandForm => "land_form",
            Mode::LandToPreland => "land_to_preland",
            Mode::EditOrder => "edit_order",
        };
        write!(f, "{}", name)
    }
}
