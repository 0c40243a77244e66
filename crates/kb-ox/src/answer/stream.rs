use async_stream::try_stream;
use futures_util::stream::BoxStream;
use kb_ox_common::TextChunkReader;

use super::extract::{AnswerExtractor, ExtractMode};
use crate::error::KnowledgeBaseError;

/// Read an accepted answer response to the end.
///
/// Each chunk is decoded and run through the extractor; the full answer is
/// yielded whenever it grew, including once more if the end-of-stream flush
/// adds to it.
pub(crate) fn answer_updates(
    response: reqwest::Response,
    mode: ExtractMode,
) -> BoxStream<'static, Result<String, KnowledgeBaseError>> {
    Box::pin(try_stream! {
        let mut reader = TextChunkReader::new(response);
        let mut extractor = AnswerExtractor::new(mode);

        while let Some(fragment) = reader
            .next_fragment()
            .await
            .map_err(|e| KnowledgeBaseError::StreamRead(e.message()))?
        {
            if extractor.push(&fragment) {
                yield extractor.answer().to_string();
            }
        }

        if extractor.finish() {
            yield extractor.answer().to_string();
        }
    })
}
