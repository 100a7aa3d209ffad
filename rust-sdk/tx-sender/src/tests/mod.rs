mod pipeline_test;
mod websocket;
