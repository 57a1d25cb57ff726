//! Weather lookup via wttr.in, with canned data when the service is unreachable.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use super::{required_arg, Tool};
use crate::action::ToolArgs;

/// Furthest day (counted from today) a forecast may be requested for.
pub const MAX_FORECAST_DAYS: i64 = 6;

/// `get_weather(city, days)`.
pub struct WeatherTool {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct WttrReport {
    current_condition: Vec<CurrentCondition>,
    #[serde(default)]
    weather: Vec<DailyForecast>,
}

#[derive(Debug, Deserialize)]
struct CurrentCondition {
    #[serde(rename = "weatherDesc")]
    weather_desc: Vec<TextValue>,
    #[serde(rename = "temp_C")]
    temp_c: String,
}

#[derive(Debug, Deserialize)]
struct DailyForecast {
    #[serde(rename = "maxtempC")]
    max_temp_c: String,
    #[serde(rename = "mintempC")]
    min_temp_c: String,
    #[serde(rename = "avgtempC")]
    avg_temp_c: String,
    hourly: Vec<HourlyForecast>,
}

#[derive(Debug, Deserialize)]
struct HourlyForecast {
    #[serde(rename = "weatherDesc")]
    weather_desc: Vec<TextValue>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    value: String,
}

/// Why a live lookup did not produce a report.
enum FetchError {
    /// Service unreachable or not answering with JSON: use canned data.
    Unavailable(String),
    /// Service answered, but not in the expected shape.
    Malformed(String),
}

impl WeatherTool {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    async fn fetch(&self, city: &str) -> Result<WttrReport, FetchError> {
        let url = format!(
            "{}/{}?format=j1",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(city)
        );

        let body = async {
            self.http
                .get(&url)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await
        }
        .await
        .map_err(|e| FetchError::Unavailable(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| {
            if e.is_data() {
                FetchError::Malformed(e.to_string())
            } else {
                FetchError::Unavailable(e.to_string())
            }
        })
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "查询指定城市的天气信息。city: 城市名称（必填）；days: 查询未来第几天的天气，0=今天，1=明天，2=后天，...，最多6天（选填，默认为0）"
    }

    fn usage(&self) -> &str {
        "get_weather(city=\"城市名\", days=\"天数\")  示例: get_weather(city=\"北京\", days=\"0\")"
    }

    async fn execute(&self, args: &ToolArgs) -> anyhow::Result<String> {
        let city = required_arg(args, "city")?;
        let days_raw = args.get("days").map(|d| d.trim()).unwrap_or("0");

        let days = match days_raw.parse::<i64>() {
            Ok(d) if (0..=MAX_FORECAST_DAYS).contains(&d) => d,
            Ok(_) => {
                return Ok("错误: 天气预报仅支持查询今天到未来6天的天气".to_string());
            }
            Err(_) => {
                return Ok(format!(
                    "错误: 无效的天数参数 '{}'，请使用0-6之间的数字",
                    days_raw
                ));
            }
        };

        let today = Local::now().date_naive();

        match self.fetch(city).await {
            Ok(report) => Ok(describe_report(city, days, &report, today)),
            Err(FetchError::Malformed(detail)) => Ok(format!(
                "错误: 解析天气数据失败，可能是城市名称无效 - {}",
                detail
            )),
            Err(FetchError::Unavailable(reason)) => {
                tracing::warn!("Weather API unavailable, using mock data: {}", reason);
                Ok(fallback_weather(city, days, today))
            }
        }
    }
}

fn first_desc(descs: &[TextValue]) -> Option<&str> {
    descs.first().map(|d| d.value.as_str())
}

fn describe_report(city: &str, days: i64, report: &WttrReport, today: NaiveDate) -> String {
    let date = date_description(days, today);
    let parse_error =
        |what: &str| format!("错误: 解析天气数据失败，可能是城市名称无效 - missing {}", what);

    if days == 0 {
        let Some(current) = report.current_condition.first() else {
            return parse_error("current_condition");
        };
        let Some(desc) = first_desc(&current.weather_desc) else {
            return parse_error("weatherDesc");
        };
        return format!("{}{}天气: {}，气温{}°C", city, date, desc, current.temp_c);
    }

    // `weather[0]` is today's forecast.
    let Some(forecast) = report.weather.get(days as usize) else {
        return format!("抱歉，无法获取{}{}的天气预报", city, date);
    };
    // Slot 4 of the 3-hourly series is noon.
    let Some(desc) = forecast.hourly.get(4).and_then(|h| first_desc(&h.weather_desc)) else {
        return parse_error("hourly[4].weatherDesc");
    };
    format!(
        "{}{}天气预报: {}，最高{}°C，最低{}°C，平均{}°C",
        city, date, desc, forecast.max_temp_c, forecast.min_temp_c, forecast.avg_temp_c
    )
}

/// Human-readable day label such as `明天(10月17日)`.
pub fn date_description(days: i64, today: NaiveDate) -> String {
    let date = (today + chrono::Duration::days(days)).format("%m月%d日");
    match days {
        0 => format!("今天({})", date),
        1 => format!("明天({})", date),
        2 => format!("后天({})", date),
        7 => format!("一周后({})", date),
        n => format!("未来第{}天({})", n, date),
    }
}

struct MockDay {
    weather: &'static str,
    temp: &'static str,
    max: &'static str,
    min: &'static str,
}

const fn day(
    weather: &'static str,
    temp: &'static str,
    max: &'static str,
    min: &'static str,
) -> MockDay {
    MockDay {
        weather,
        temp,
        max,
        min,
    }
}

const BEIJING: [MockDay; 4] = [
    day("晴天", "15", "20", "10"),
    day("多云", "16", "21", "11"),
    day("晴天", "17", "22", "12"),
    day("小雨", "14", "18", "10"),
];

const SHANGHAI: [MockDay; 4] = [
    day("多云", "18", "22", "15"),
    day("阴天", "19", "23", "16"),
    day("小雨", "17", "21", "14"),
    day("多云", "18", "22", "15"),
];

const GUANGZHOU: [MockDay; 4] = [
    day("阴天", "22", "26", "19"),
    day("多云", "23", "27", "20"),
    day("晴天", "24", "28", "21"),
    day("小雨", "21", "25", "18"),
];

const DEFAULT_CITY: [MockDay; 4] = [
    day("晴天", "20", "24", "16"),
    day("多云", "21", "25", "17"),
    day("晴天", "22", "26", "18"),
    day("小雨", "19", "23", "15"),
];

/// Canned weather used when the live service cannot be reached.
pub fn fallback_weather(city: &str, days: i64, today: NaiveDate) -> String {
    let table: &[MockDay] = match city {
        "北京" => &BEIJING,
        "上海" => &SHANGHAI,
        "广州" => &GUANGZHOU,
        _ => &DEFAULT_CITY,
    };
    let data = &table[days.rem_euclid(table.len() as i64) as usize];
    let date = date_description(days, today);

    if days == 0 {
        format!(
            "{}{}天气: {}，气温{}°C（模拟数据）",
            city, date, data.weather, data.temp
        )
    } else {
        format!(
            "{}{}天气预报: {}，最高{}°C，最低{}°C（模拟数据）",
            city, date, data.weather, data.max, data.min
        )
    }
}
