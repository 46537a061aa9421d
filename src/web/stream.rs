//! 持久双向识别通道。
//!
//! 每个连接一个顺序循环：读取一条消息、处理完毕、回复，然后才读取下一条，
//! 因此同一连接上的消息严格按到达顺序应答。格式错误的消息得到 `error`
//! 回复，连接保持打开。

use super::wire::Outbound;
use super::AppState;
use crate::Result;
use axum::{
    extract::{
        ws::{Message, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Display;

/// 上行消息
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Inbound {
    Image {
        data: String,
        #[serde(default)]
        visualize: bool,
    },
    AnswerRequest {
        #[serde(alias = "data")]
        frame: String,
        question_id: u64,
        #[serde(default)]
        user_id: Option<u64>,
    },
    Echo {
        #[serde(default)]
        message: Value,
    },
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| async move {
        let (sink, stream) = socket.split();
        run_session(stream, sink, state).await;
    })
}

/// 驱动一个连接直到对端关闭或传输出错
pub async fn run_session<R, W, E>(mut inbound: R, mut outbound: W, state: AppState)
where
    R: Stream<Item = std::result::Result<Message, E>> + Unpin,
    E: Display,
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    tracing::info!("WebSocket session opened");

    while let Some(frame) = inbound.next().await {
        let message = match frame {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!("WebSocket receive failed: {}", e);
                break;
            }
        };

        let reply = match message {
            Message::Text(text) => match parse_inbound(&text) {
                Ok(request) => handle_inbound(&state, request).await,
                Err(reply) => reply,
            },
            Message::Binary(_) => Outbound::error(
                "UNSUPPORTED_MESSAGE",
                "Binary frames are not supported, send JSON text",
            ),
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(_) => break,
        };

        let payload = match serde_json::to_string(&reply) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to serialize WebSocket reply: {}", e);
                continue;
            }
        };

        if let Err(e) = outbound.send(Message::Text(payload)).await {
            tracing::debug!("WebSocket send failed: {}", e);
            break;
        }
    }

    tracing::info!("WebSocket session closed");
}

/// 不带 `type` 但带 `message` 字段的对象按回显处理
fn parse_inbound(text: &str) -> std::result::Result<Inbound, Outbound> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| Outbound::error("INVALID_JSON", format!("Malformed message: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| Outbound::error("INVALID_MESSAGE", "Message must be a JSON object"))?;

    if !object.contains_key("type") {
        return match object.get("message") {
            Some(message) => Ok(Inbound::Echo {
                message: message.clone(),
            }),
            None => Err(Outbound::error("INVALID_MESSAGE", "Message has no type")),
        };
    }

    serde_json::from_value(value)
        .map_err(|e| Outbound::error("INVALID_MESSAGE", format!("Unsupported message: {}", e)))
}

async fn handle_inbound(state: &AppState, request: Inbound) -> Outbound {
    match request {
        Inbound::Image { data, visualize } => {
            match state.recognition.recognize_base64(&data, visualize).await {
                Ok(report) => Outbound::RecognitionResult {
                    data: report.into(),
                },
                Err(e) => {
                    tracing::warn!("WebSocket recognition failed: {}", e);
                    e.into()
                }
            }
        }
        Inbound::AnswerRequest {
            frame,
            question_id,
            user_id,
        } => {
            let Some(user_id) = user_id else {
                return Outbound::error("INVALID_MESSAGE", "answer_request requires user_id");
            };
            match answer(state, &frame, question_id, user_id).await {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::warn!("WebSocket answer request failed: {}", e);
                    e.into()
                }
            }
        }
        Inbound::Echo { message } => {
            let text = match message {
                Value::String(s) => s,
                other => other.to_string(),
            };
            Outbound::Echo {
                response: format!("Echo: {}", text),
            }
        }
    }
}

async fn answer(state: &AppState, frame: &str, question_id: u64, user_id: u64) -> Result<Outbound> {
    let report = state.recognition.recognize_base64(frame, false).await?;
    let predicted = report.outcome.label;

    let verdict = state
        .quiz
        .verify_outcome(question_id, predicted.as_deref(), user_id)
        .await?;

    Ok(Outbound::AnswerResponse {
        is_correct: verdict.is_correct,
        answer: predicted,
        correct_answer: verdict.correct_answer,
        message: verdict.message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_message_object_is_echo() {
        match parse_inbound(r#"{"message": "hi"}"#) {
            Ok(Inbound::Echo { message }) => assert_eq!(message, "hi"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn answer_request_accepts_data_alias() {
        match parse_inbound(r#"{"type":"answer_request","data":"abc","question_id":3,"user_id":9}"#) {
            Ok(Inbound::AnswerRequest {
                frame,
                question_id,
                user_id,
            }) => {
                assert_eq!(frame, "abc");
                assert_eq!(question_id, 3);
                assert_eq!(user_id, Some(9));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn malformed_messages_become_error_replies() {
        for text in ["not json", "[1,2]", r#"{"type":"bogus"}"#, r#"{"type":"image"}"#, "{}"] {
            match parse_inbound(text) {
                Err(Outbound::Error { .. }) => {}
                other => panic!("{} parsed as {:?}", text, other),
            }
        }
    }
}
