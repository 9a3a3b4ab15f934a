//! `POST /generate`: promotional copy for a web novel in a chosen style.
//!
//! The browser client posts `{style1, count1}` and reads the reply only on a 2xx status, so
//! rejected input is reported as `{"success": false, "error": ...}` with status 200.

use chrono::{Local, NaiveDateTime};
use funcshim_core::context::RequestContext;
use funcshim_core::error::ShimError;
use funcshim_core::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MIN_TOOLS: i64 = 6;
pub const MAX_TOOLS: i64 = 15;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writing devices, in the order they are picked.
const TOOLS: [&str; MAX_TOOLS as usize] = [
    "悬念开头",
    "反转剧情",
    "金句点睛",
    "人物对白",
    "情绪渲染",
    "场景描写",
    "伏笔埋设",
    "冲突升级",
    "细节特写",
    "内心独白",
    "对比反差",
    "节奏把控",
    "数字冲击",
    "互动提问",
    "留白结尾",
];

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub style1: Option<String>,
    #[serde(default)]
    pub count1: Option<Value>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct CopyBody {
    #[serde(rename = "风格")]
    pub style: String,
    #[serde(rename = "工具数量")]
    pub tool_count: usize,
    #[serde(rename = "选中工具")]
    pub tools: Vec<String>,
    #[serde(rename = "内容")]
    pub content: String,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct GeneratedCopy {
    pub success: bool,
    #[serde(rename = "热门标题")]
    pub titles: Vec<String>,
    #[serde(rename = "主体文案")]
    pub body: CopyBody,
    #[serde(rename = "配图建议")]
    pub image_suggestions: Vec<String>,
    #[serde(rename = "生成时间")]
    pub generated_at: String,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct GenerateFailure {
    pub success: bool,
    pub error: String,
}

impl GenerateFailure {
    fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GenerateReply {
    Generated(GeneratedCopy),
    Failed(GenerateFailure),
}

/// Check the request and build the copy. Output depends only on the input and `now`.
pub fn generate_copy(request: &GenerateRequest, now: NaiveDateTime) -> GenerateReply {
    let style = match request.style1.as_deref().map(str::trim) {
        Some(style) if !style.is_empty() => style,
        _ => return GenerateReply::Failed(GenerateFailure::new("请选择文案风格")),
    };
    let count = match request.count1.as_ref().and_then(Value::as_i64) {
        Some(count) if (MIN_TOOLS..=MAX_TOOLS).contains(&count) => count as usize,
        _ => {
            return GenerateReply::Failed(GenerateFailure::new(format!(
                "工具数量必须在{MIN_TOOLS}到{MAX_TOOLS}之间"
            )))
        }
    };

    let tools: Vec<String> = TOOLS.iter().take(count).map(|tool| tool.to_string()).collect();
    let content = tools
        .iter()
        .enumerate()
        .map(|(index, tool)| format!("{}. 【{tool}】以{style}的笔触推进故事。", index + 1))
        .collect::<Vec<_>>()
        .join("\n");

    GenerateReply::Generated(GeneratedCopy {
        success: true,
        titles: vec![
            format!("{style}力作：一口气读到天亮"),
            format!("{count}个细节，让你欲罢不能"),
            format!("全网热议的{style}小说，结局没人猜到"),
        ],
        body: CopyBody {
            style: style.to_string(),
            tool_count: count,
            tools,
            content,
        },
        image_suggestions: vec![
            format!("主角剪影配{style}色调的标题大字"),
            "关键情节的对比拼图".to_string(),
            "书页特写配一句金句".to_string(),
        ],
        generated_at: now.format(TIMESTAMP_FORMAT).to_string(),
    })
}

pub(crate) async fn generate(ctx: RequestContext) -> Result<Json<GenerateReply>, ShimError> {
    let reply = match ctx.json::<GenerateRequest>() {
        Ok(request) => generate_copy(&request, Local::now().naive_local()),
        Err(_) => GenerateReply::Failed(GenerateFailure::new("请求体必须是 JSON 对象")),
    };
    Ok(Json(reply))
}
