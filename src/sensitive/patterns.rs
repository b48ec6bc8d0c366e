//! Built-in sensitive content patterns
//!
//! Each entry is `(name, regex)`. When a regex has a capture group, group 1 is
//! the reported value; otherwise the whole match is.

pub(crate) const BUILTIN_PATTERNS: &[(&str, &str)] = &[
    // Personal data
    ("email", r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,10}\b"),
    ("cn_mobile", r"\b(1[3-9]\d{9})\b"),
    ("cn_id_card", r"\b([1-9]\d{5}(?:18|19|20)\d{2}(?:0[1-9]|1[0-2])(?:0[1-9]|[12]\d|3[01])\d{3}[\dXx])\b"),
    ("us_ssn", r"\b(\d{3}-\d{2}-\d{4})\b"),
    ("credit_card", r"\b((?:4\d{3}|5[1-5]\d{2}|6011|3[47]\d{2})[- ]?\d{4}[- ]?\d{4}[- ]?\d{1,4})\b"),
    ("internal_ip", r"\b((?:10|127)\.\d{1,3}\.\d{1,3}\.\d{1,3}|192\.168\.\d{1,3}\.\d{1,3}|172\.(?:1[6-9]|2\d|3[01])\.\d{1,3}\.\d{1,3})\b"),
    // Cloud credentials
    ("aws_access_key_id", r"\b((?:AKIA|ASIA)[0-9A-Z]{16})\b"),
    ("aws_secret_access_key", r#"(?i)aws.{0,20}secret.{0,20}['"]([0-9a-zA-Z/+=]{40})['"]"#),
    ("aliyun_access_key_id", r"\b(LTAI[0-9A-Za-z]{12,20})\b"),
    ("tencent_secret_id", r"\b(AKID[0-9A-Za-z]{32})\b"),
    ("google_api_key", r"\b(AIza[0-9A-Za-z_-]{35})\b"),
    ("google_oauth_client", r"\b([0-9]+-[0-9a-z_]{32}\.apps\.googleusercontent\.com)\b"),
    ("azure_storage_key", r"(?i)AccountKey=([A-Za-z0-9+/=]{60,100})"),
    ("s3_bucket", r"\b([a-z0-9.-]{3,63}\.s3(?:[.-][a-z0-9-]+)?\.amazonaws\.com)\b"),
    ("oss_bucket", r"\b([a-z0-9-]{3,63}\.oss-[a-z0-9-]+\.aliyuncs\.com)\b"),
    // Service tokens
    ("github_token", r"\b((?:ghp|gho|ghu|ghs|ghr)_[A-Za-z0-9]{36})\b"),
    ("gitlab_token", r"\b(glpat-[A-Za-z0-9_-]{20})\b"),
    ("slack_token", r"\b(xox[baprs]-[0-9A-Za-z-]{10,72})\b"),
    ("stripe_secret_key", r"\b((?:sk|rk)_live_[0-9a-zA-Z]{24,99})\b"),
    ("stripe_publishable_key", r"\b(pk_live_[0-9a-zA-Z]{24,99})\b"),
    ("twilio_api_key", r"\b(SK[0-9a-fA-F]{32})\b"),
    ("sendgrid_api_key", r"\b(SG\.[A-Za-z0-9_-]{22}\.[A-Za-z0-9_-]{43})\b"),
    ("mailgun_api_key", r"\b(key-[0-9a-zA-Z]{32})\b"),
    ("npm_token", r"\b(npm_[A-Za-z0-9]{36})\b"),
    ("openai_api_key", r"\b(sk-[A-Za-z0-9_-]{20,}T3BlbkFJ[A-Za-z0-9_-]{20,})\b"),
    ("jwt", r"\b(eyJ[A-Za-z0-9_-]{8,}\.eyJ[A-Za-z0-9_-]{8,}\.[A-Za-z0-9_-]{8,})\b"),
    ("bearer_token", r"(?i)\bbearer\s+([A-Za-z0-9._~+/-]{20,}=*)"),
    ("basic_auth_header", r"(?i)\bbasic\s+([A-Za-z0-9+/]{16,}={0,2})"),
    // Webhooks
    ("slack_webhook", r"(https://hooks\.slack\.com/services/[A-Za-z0-9]+/[A-Za-z0-9]+/[A-Za-z0-9]+)"),
    ("discord_webhook", r"(https://(?:ptb\.|canary\.)?discord(?:app)?\.com/api/webhooks/\d+/[A-Za-z0-9_-]+)"),
    ("dingtalk_webhook", r"(https://oapi\.dingtalk\.com/robot/send\?access_token=[0-9a-f]{64})"),
    ("feishu_webhook", r"(https://open\.feishu\.cn/open-apis/bot/v2/hook/[0-9a-f-]{36})"),
    ("wecom_webhook", r"(https://qyapi\.weixin\.qq\.com/cgi-bin/webhook/send\?key=[0-9a-f-]{36})"),
    // Keys and connection strings
    ("private_key", r"(-----BEGIN (?:RSA |EC |DSA |OPENSSH |PGP |ENCRYPTED )?PRIVATE KEY(?: BLOCK)?-----)"),
    ("db_connection_string", r#"\b((?:mysql|postgres(?:ql)?|mongodb(?:\+srv)?|redis|amqp|mssql)://[^\s"'<>]+:[^\s"'<>]+@[^\s"'<>]+)"#),
    ("jdbc_url", r#"(jdbc:[a-z0-9]+://[^\s"'<>]+)"#),
    // Generic key/value secrets
    ("password_assignment", r#"(?i)\b(?:password|passwd|pwd)\s*[=:]\s*["']([^"'\s]{4,64})["']"#),
    ("api_key_assignment", r#"(?i)\b(?:api[_-]?key|apikey|app[_-]?key)\s*[=:]\s*["']([A-Za-z0-9_\-]{16,})["']"#),
    ("secret_assignment", r#"(?i)\b(?:secret|client[_-]?secret|app[_-]?secret)\s*[=:]\s*["']([A-Za-z0-9_\-]{16,})["']"#),
    ("access_token_assignment", r#"(?i)\b(?:access[_-]?token|auth[_-]?token|token)\s*[=:]\s*["']([A-Za-z0-9._\-]{20,})["']"#),
    ("source_map", r"(?m)//[#@]\s*sourceMappingURL=(\S+\.map)"),
];
