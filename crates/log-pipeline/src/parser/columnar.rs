//! 헤더가 있는 공백 구분 컬럼 파서
//!
//! 객체의 첫 줄(seq 0)이 컬럼 이름 헤더이고, 이후 각 줄이 같은 순서의 값입니다.
//! 파서는 헤더를 기억하므로 한 객체 안에서만 상태를 가집니다.
//!
//! ```text
//! version account-id interface-id srcaddr dstaddr ...   <- 헤더: 레코드 없음
//! 2 123456789012 eni-0a1b2c3d 10.0.0.1 10.0.0.2 ...     <- 레코드 하나
//! ```
//!
//! - 허용 컬럼 목록이 있으면 헤더의 다른 이름은 `UnknownColumn` 에러입니다.
//! - 기본 컬럼 순서가 있으면 헤더 없이 시작하는 객체도 읽습니다.
//!   seq 0의 첫 값이 알려진 컬럼 이름이 아니면 데이터 행으로 봅니다.
//! - 행의 필드 수가 헤더와 다르면 `FieldCount` 에러입니다.
//! - 빈 줄은 레코드를 만들지 않습니다.
//!
//! [`ColumnarParser::vpc_flow_logs`]는 AWS VPC Flow Logs (v2-v5) 프리셋입니다.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use logfeed_core::error::ParseError;
use logfeed_core::pipeline::LogParser;
use logfeed_core::types::{LogRecord, RawFrame};

use super::timestamp::from_unix_seconds;

/// VPC Flow Logs 레코드 태그
pub const VPC_FLOW_LOGS_TAG: &str = "aws.vpcflowlogs";

/// VPC Flow Logs 기본(v2) 컬럼
pub const VPC_FLOW_LOGS_V2_COLUMNS: &[&str] = &[
    "version",
    "account-id",
    "interface-id",
    "srcaddr",
    "dstaddr",
    "srcport",
    "dstport",
    "protocol",
    "packets",
    "bytes",
    "start",
    "end",
    "action",
    "log-status",
];

/// VPC Flow Logs v3-v5에서 추가된 컬럼
pub const VPC_FLOW_LOGS_EXTENDED_COLUMNS: &[&str] = &[
    // v3
    "vpc-id",
    "subnet-id",
    "instance-id",
    "tcp-flags",
    "type",
    "pkt-srcaddr",
    "pkt-dstaddr",
    // v4
    "region",
    "az-id",
    "sublocation-type",
    "sublocation-id",
    // v5
    "pkt-src-aws-service",
    "pkt-dst-aws-service",
    "flow-direction",
    "traffic-path",
];

/// 컬럼 파서
#[derive(Debug, Clone)]
pub struct ColumnarParser {
    format: String,
    tag: String,
    known_columns: Vec<String>,
    default_columns: Vec<String>,
    timestamp_column: Option<String>,
    /// 현재 객체의 활성 컬럼 순서
    columns: Option<Vec<String>>,
}

impl ColumnarParser {
    /// 새 파서를 생성합니다. 허용 목록과 기본 컬럼 없이 시작합니다.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            format: "columnar".to_owned(),
            tag: tag.into(),
            known_columns: Vec::new(),
            default_columns: Vec::new(),
            timestamp_column: None,
            columns: None,
        }
    }

    /// AWS VPC Flow Logs 프리셋
    ///
    /// 태그 `aws.vpcflowlogs`, `start` 컬럼을 타임스탬프로 사용하고,
    /// 헤더가 없으면 v2 컬럼 순서를 가정합니다.
    pub fn vpc_flow_logs() -> Self {
        let known = VPC_FLOW_LOGS_V2_COLUMNS
            .iter()
            .chain(VPC_FLOW_LOGS_EXTENDED_COLUMNS)
            .map(|c| (*c).to_owned());
        Self::new(VPC_FLOW_LOGS_TAG)
            .with_format_name("vpc_flow_logs")
            .with_known_columns(known)
            .with_default_columns(VPC_FLOW_LOGS_V2_COLUMNS.iter().map(|c| (*c).to_owned()))
            .with_timestamp_column("start")
    }

    /// 허용 컬럼 목록을 지정합니다.
    pub fn with_known_columns(mut self, columns: impl IntoIterator<Item = String>) -> Self {
        self.known_columns = columns.into_iter().collect();
        self
    }

    /// 헤더가 없을 때 사용할 컬럼 순서를 지정합니다.
    pub fn with_default_columns(mut self, columns: impl IntoIterator<Item = String>) -> Self {
        self.default_columns = columns.into_iter().collect();
        self
    }

    /// 유닉스 초 타임스탬프 컬럼을 지정합니다.
    pub fn with_timestamp_column(mut self, column: impl Into<String>) -> Self {
        self.timestamp_column = Some(column.into());
        self
    }

    /// 형식 이름을 지정합니다 (에러/메트릭 표시용).
    pub fn with_format_name(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    fn is_known(&self, column: &str) -> bool {
        self.known_columns.is_empty() || self.known_columns.iter().any(|c| c == column)
    }

    fn looks_like_header(&self, fields: &[&str]) -> bool {
        if self.default_columns.is_empty() {
            return true;
        }
        // 기본 컬럼이 있으면 첫 값이 컬럼 이름일 때만 헤더로 본다
        !self.known_columns.is_empty() && fields.first().is_some_and(|f| self.is_known(f))
    }

    fn set_header(&mut self, fields: &[&str]) -> Result<(), ParseError> {
        if let Some(unknown) = fields.iter().find(|f| !self.is_known(f)) {
            return Err(ParseError::UnknownColumn {
                format: self.format.clone(),
                column: (*unknown).to_owned(),
            });
        }
        self.columns = Some(fields.iter().map(|f| (*f).to_owned()).collect());
        Ok(())
    }

    fn timestamp(&self, row: &Map<String, Value>) -> Result<DateTime<Utc>, ParseError> {
        let Some(column) = &self.timestamp_column else {
            return Ok(DateTime::<Utc>::UNIX_EPOCH);
        };
        let raw = row
            .get(column)
            .and_then(Value::as_str)
            .ok_or_else(|| ParseError::MissingField {
                format: self.format.clone(),
                field: column.clone(),
            })?;
        raw.parse::<i64>()
            .ok()
            .and_then(from_unix_seconds)
            .ok_or_else(|| ParseError::InvalidTimestamp {
                format: self.format.clone(),
                value: raw.to_owned(),
                reason: "expected unix seconds".to_owned(),
            })
    }
}

impl LogParser for ColumnarParser {
    fn format_name(&self) -> &str {
        &self.format
    }

    fn parse(&mut self, frame: &RawFrame) -> Result<Vec<LogRecord>, ParseError> {
        let text = std::str::from_utf8(&frame.data).map_err(|e| ParseError::Malformed {
            format: self.format.clone(),
            reason: e.to_string(),
        })?;
        let fields: Vec<&str> = text.split_ascii_whitespace().collect();
        if fields.is_empty() {
            return Ok(Vec::new());
        }

        if frame.seq == 0 && self.looks_like_header(&fields) {
            self.set_header(&fields)?;
            return Ok(Vec::new());
        }

        let columns = match &self.columns {
            Some(columns) => columns,
            None if !self.default_columns.is_empty() => &self.default_columns,
            None => {
                return Err(ParseError::MissingHeader {
                    format: self.format.clone(),
                });
            }
        };

        if fields.len() != columns.len() {
            return Err(ParseError::FieldCount {
                format: self.format.clone(),
                expected: columns.len(),
                actual: fields.len(),
            });
        }

        let row: Map<String, Value> = columns
            .iter()
            .zip(&fields)
            .map(|(column, field)| (column.clone(), Value::String((*field).to_owned())))
            .collect();
        let ts = self.timestamp(&row)?;

        Ok(vec![LogRecord::from_frame(
            frame,
            self.tag.clone(),
            ts,
            Value::Object(row),
        )])
    }
}
