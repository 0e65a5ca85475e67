use serde::Deserialize;

const TEXT_START: u32 = 0x0001_0000;
const DATA_START: u32 = 0x1000_0000;
const STACK_POINTER: u32 = 0xBFFF_FFF0;
const GLOBAL_POINTER: u32 = 0x1000_8000;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub registers: RegisterConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub trace_instructions: bool,

    #[serde(default = "default_text_start")]
    pub text_start: String,

    #[serde(default = "default_data_start")]
    pub data_start: String,
}

impl GeneralConfig {
    pub fn text_start_val(&self) -> u32 {
        parse_hex(&self.text_start, TEXT_START)
    }

    pub fn data_start_val(&self) -> u32 {
        parse_hex(&self.data_start, DATA_START)
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace_instructions: false,
            text_start: default_text_start(),
            data_start: default_data_start(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterConfig {
    #[serde(default = "default_sp")]
    pub sp: String,

    #[serde(default = "default_gp")]
    pub gp: String,
}

impl RegisterConfig {
    pub fn sp_val(&self) -> u32 {
        parse_hex(&self.sp, STACK_POINTER)
    }

    pub fn gp_val(&self) -> u32 {
        parse_hex(&self.gp, GLOBAL_POINTER)
    }
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self {
            sp: default_sp(),
            gp: default_gp(),
        }
    }
}

fn parse_hex(s: &str, default: u32) -> u32 {
    let s = s.trim_start_matches("0x");
    u32::from_str_radix(s, 16).unwrap_or(default)
}

fn default_text_start() -> String {
    format!("{:#x}", TEXT_START)
}

fn default_data_start() -> String {
    format!("{:#x}", DATA_START)
}

fn default_sp() -> String {
    format!("{:#x}", STACK_POINTER)
}

fn default_gp() -> String {
    format!("{:#x}", GLOBAL_POINTER)
}
