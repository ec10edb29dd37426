use octet_core::codec::{long_form, short_form};
use octet_core::{disassemble, Engine, Register};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

macro_rules! console_log {
    ($($t:tt)*) => (log(&format!($($t)*)))
}

/// Result of importing a saved state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub filename: Option<String>,
    pub warnings: Vec<String>,
}

/// One disassembled row as handed to JS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRow {
    pub address: u8,
    pub bytes: Vec<u8>,
    pub text: String,
    pub illegal: bool,
}

#[wasm_bindgen]
pub struct WasmMachine {
    engine: Engine,
}

impl Default for WasmMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl WasmMachine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        console_error_panic_hook::set_once();
        Self {
            engine: Engine::default(),
        }
    }

    /// Consumes one byte. Returns the cycle outcome as a JS object.
    pub fn cycle(&mut self) -> Result<JsValue, JsError> {
        to_js(&self.engine.cycle())
    }

    /// Runs to the end of the current instruction.
    pub fn step_instruction(&mut self) -> Result<JsValue, JsError> {
        to_js(&self.engine.step_instruction())
    }

    /// Runs `cycles` cycles and returns the number of completed instructions.
    pub fn run(&mut self, cycles: u32) -> u32 {
        let completed = self.engine.run(cycles as usize);
        u32::try_from(completed).unwrap_or(u32::MAX)
    }

    /// Resets the machine and loads a program at address 0.
    pub fn load_program(&mut self, program: &[u8]) -> usize {
        let copied = self.engine.load(program);
        console_log!("Loaded {} bytes into memory", copied);
        copied
    }

    /// Assembles `source` and loads the result. Errors read `line N: ...`.
    pub fn assemble_and_load(&mut self, source: &str) -> Result<usize, JsError> {
        assemble_into(&mut self.engine, source).map_err(|msg| JsError::new(&msg))
    }

    pub fn reset(&mut self) {
        self.engine.reset();
    }

    /// Returns the full machine snapshot as a JS object.
    pub fn state(&self) -> Result<JsValue, JsError> {
        to_js(&self.engine.get_state())
    }

    /// Copies main memory into a `Uint8Array`.
    pub fn memory(&self) -> js_sys::Uint8Array {
        js_sys::Uint8Array::from(&self.engine.machine().memory_bytes()[..])
    }

    /// Copies video memory into a `Uint8Array`.
    pub fn video_memory(&self) -> js_sys::Uint8Array {
        js_sys::Uint8Array::from(&self.engine.machine().video_memory_bytes()[..])
    }

    pub fn set_register(&mut self, index: u8, value: u8) -> Result<(), JsError> {
        let register = register_from_index(index).map_err(|msg| JsError::new(&msg))?;
        self.engine.set_register(register, value);
        Ok(())
    }

    pub fn set_memory(&mut self, address: u8, value: u8) {
        self.engine.set_memory(address, value);
    }

    pub fn set_video_memory(&mut self, address: u8, value: u8) {
        self.engine.set_video_memory(address, value);
    }

    pub fn set_program_counter(&mut self, value: u8) {
        self.engine.set_program_counter(value);
    }

    /// Forwards every event to `callback` as a serialized object with a
    /// `type` field.
    pub fn on_event(&self, callback: js_sys::Function) -> Result<(), JsError> {
        self.engine
            .bus()
            .listen_all(move |event| match serde_wasm_bindgen::to_value(event) {
                Ok(value) => {
                    if let Err(err) = callback.call1(&JsValue::NULL, &value) {
                        web_sys::console::error_2(&"event callback failed".into(), &err);
                    }
                }
                Err(err) => web_sys::console::error_1(&err.to_string().into()),
            })
            .map_err(|err| JsError::new(&err.to_string()))
    }

    /// Disassembles `count` instructions starting at `start`.
    pub fn disassemble(&self, start: u8, count: usize) -> Result<JsValue, JsError> {
        to_js(&listing(&self.engine, start, count))
    }

    pub fn export_long_form(&self, name: Option<String>) -> String {
        long_form::encode(&self.engine.image(name))
    }

    pub fn export_short_form(&self, name: Option<String>) -> String {
        short_form::encode(&self.engine.image(name))
    }

    /// Loads a long-form state. Returns `{ filename, warnings }`.
    pub fn import_long_form(&mut self, text: &str) -> Result<JsValue, JsError> {
        to_js(&import_long(&mut self.engine, text))
    }

    /// Loads a short-form query string. Returns the stored file name.
    pub fn import_short_form(&mut self, query: &str) -> Result<Option<String>, JsError> {
        import_short(&mut self.engine, query).map_err(|msg| JsError::new(&msg))
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value).map_err(|err| JsError::new(&err.to_string()))
}

fn register_from_index(index: u8) -> Result<Register, String> {
    Register::from_index(index).ok_or_else(|| format!("no register R{index}"))
}

fn assemble_into(engine: &mut Engine, source: &str) -> Result<usize, String> {
    let bytes = octet_asm::assemble(source).map_err(|err| err.to_string())?;
    Ok(engine.load(&bytes))
}

fn import_long(engine: &mut Engine, text: &str) -> ImportReport {
    let (image, warnings) = long_form::decode(text);
    engine.load_image(&image);
    ImportReport {
        filename: image.filename,
        warnings: warnings.iter().map(ToString::to_string).collect(),
    }
}

fn import_short(engine: &mut Engine, query: &str) -> Result<Option<String>, String> {
    let image = short_form::decode(query).ok_or_else(|| "malformed state query".to_string())?;
    engine.load_image(&image);
    Ok(image.filename)
}

fn listing(engine: &Engine, start: u8, count: usize) -> Vec<ListingRow> {
    disassemble(
        start,
        count,
        engine.machine().memory_bytes(),
        engine.instructions(),
    )
    .into_iter()
    .map(|row| ListingRow {
        address: row.address,
        text: if row.operands.is_empty() {
            row.mnemonic
        } else {
            format!("{} {}", row.mnemonic, row.operands)
        },
        bytes: row.bytes,
        illegal: row.is_illegal,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use octet_core::{Engine, Event, Register};

    use super::{assemble_into, import_long, import_short, listing, register_from_index};

    #[test]
    fn assemble_into_loads_program() {
        let mut engine = Engine::default();
        let copied = assemble_into(&mut engine, "MOV NUM73 R1").expect("assembles");
        assert_eq!(copied, 3);
        engine.run(3);
        assert_eq!(engine.machine().register(Register::R1), 73);
    }

    #[test]
    fn assemble_errors_carry_line() {
        let mut engine = Engine::default();
        let err = assemble_into(&mut engine, "NOP\nBOGUS").expect_err("unknown mnemonic");
        assert_eq!(err, "line 2: unknown mnemonic `BOGUS`");
    }

    #[test]
    fn register_index_is_checked() {
        assert_eq!(register_from_index(7), Ok(Register::R7));
        assert!(register_from_index(8).is_err());
    }

    #[test]
    fn long_form_import_reports_warnings() {
        let mut engine = Engine::default();
        let report = import_long(&mut engine, "FILENAME\ndemo\nMEMORY\n0x17, 0x00, bad\n");
        assert_eq!(report.filename.as_deref(), Some("demo"));
        assert_eq!(report.warnings, vec!["line 4: illegal byte `bad`".to_string()]);
        assert_eq!(engine.machine().memory(0), 0x17);
    }

    #[test]
    fn short_form_import_rejects_garbage() {
        let mut engine = Engine::default();
        assert!(import_short(&mut engine, "p=A").is_err());
        assert_eq!(
            import_short(&mut engine, "fn=x&p=AQAAAUkB"),
            Ok(Some("x".to_string()))
        );
        assert_eq!(engine.machine().memory(4), 73);
    }

    #[test]
    fn listing_joins_mnemonic_and_operands() {
        let mut engine = Engine::default();
        engine.load(&[0x01, 73, 1, 0x26]);
        let rows = listing(&engine, 0, 2);
        assert_eq!(rows[0].text, "MOV_CONST_REG 73, R1");
        assert_eq!(rows[1].text, "RET");
        assert_eq!(rows[1].address, 3);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = Event::RegisterChanged {
            register: Register::R2,
            value: 9,
        };
        let json = serde_json::to_value(&event).expect("serializes");
        assert_eq!(
            json,
            serde_json::json!({ "type": "RegisterChanged", "register": "R2", "value": 9 })
        );
    }

    #[test]
    fn snapshot_serializes_phase_and_registers() {
        let mut engine = Engine::default();
        engine.load(&[0x01, 5]);
        engine.cycle();
        let json = serde_json::to_value(engine.get_state()).expect("serializes");
        assert_eq!(json["phase"], "Collecting");
        assert_eq!(json["pending"]["name"], "MOV_CONST_REG");
        assert_eq!(json["registers"].as_array().map(Vec::len), Some(8));
    }
}
