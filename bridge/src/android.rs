//! JNI entry points called by the Android app (`com.jjv360.skadivm.logic.VMRunner`).

use jni::objects::{JObject, JString, JValue};
use jni::sys::{jint, JNI_VERSION_1_6};
use jni::{JNIEnv, JavaVM};
use std::os::raw::c_void;

use crate::bridge::{Bridge, LaunchRequest, LineSink};
use crate::error::{status_of, STATUS_INVALID_ARGUMENT};

#[no_mangle]
pub extern "system" fn JNI_OnLoad(_vm: JavaVM, _reserved: *mut c_void) -> jint {
    crate::logging::init();
    tracing::info!("skadivm bridge loaded");
    JNI_VERSION_1_6
}

/// `external fun runQemu(workingDir: String, qemuBinary: String, cmdline: String, lineIn: (String) -> Unit): Int`
#[no_mangle]
pub extern "system" fn Java_com_jjv360_skadivm_logic_VMRunner_runQemu<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    working_dir: JString<'local>,
    qemu_binary: JString<'local>,
    cmdline: JString<'local>,
    line_in: JObject<'local>,
) -> jint {
    let req = match read_request(&mut env, &working_dir, &qemu_binary, &cmdline) {
        Ok(req) => req,
        Err(e) => {
            tracing::error!("runQemu: bad arguments: {e:?}");
            let _ = env.exception_clear();
            return STATUS_INVALID_ARGUMENT;
        }
    };

    let mut sink = JavaLineSink { env: &mut env, callback: &line_in };
    let res = Bridge::default().run(&req, &mut sink);
    if let Err(e) = &res {
        tracing::error!(status = e.status(), "runQemu: {e}");
    }
    status_of(&res)
}

fn read_request(
    env: &mut JNIEnv,
    working_dir: &JString,
    qemu_binary: &JString,
    cmdline: &JString,
) -> jni::errors::Result<LaunchRequest> {
    let working_dir: String = env.get_string(working_dir)?.into();
    let qemu_binary: String = env.get_string(qemu_binary)?.into();
    let cmdline: String = if cmdline.is_null() { String::new() } else { env.get_string(cmdline)?.into() };
    Ok(LaunchRequest::new(working_dir, qemu_binary, cmdline))
}

/// Forwards lines to a Kotlin `(String) -> Unit`.
struct JavaLineSink<'a, 'local> {
    env: &'a mut JNIEnv<'local>,
    callback: &'a JObject<'local>,
}

impl JavaLineSink<'_, '_> {
    fn send(&mut self, line: &str) -> jni::errors::Result<()> {
        let s = self.env.new_string(line)?;
        self.env
            .call_method(self.callback, "invoke", "(Ljava/lang/Object;)Ljava/lang/Object;", &[JValue::Object(&s)])?;
        self.env.delete_local_ref(s)?;
        Ok(())
    }
}

impl LineSink for JavaLineSink<'_, '_> {
    fn line(&mut self, line: &str) {
        if self.callback.is_null() {
            return;
        }
        if let Err(e) = self.send(line) {
            tracing::warn!("line callback failed: {e:?}");
            let _ = self.env.exception_clear();
        }
    }
}
