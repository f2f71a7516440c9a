//! 认证相关页面：登录、注册、找回密码、重设密码与各个成功页

use leptos::prelude::*;
use leptos::task::spawn_local;
use unet360_client::guard::post_login_target;
use unet360_shared::{AppRoute, AuthCallback, PasswordReset};

use crate::state::use_app_state;
use crate::web::router::{Link, use_router};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Signup,
    Recovery,
}

impl AuthMode {
    fn title(self) -> &'static str {
        match self {
            AuthMode::Login => "Inicia sesión",
            AuthMode::Signup => "Regístrate",
            AuthMode::Recovery => "Recupera tu contraseña",
        }
    }

    fn submit_label(self) -> &'static str {
        match self {
            AuthMode::Login => "Entrar",
            AuthMode::Signup => "Crear cuenta",
            AuthMode::Recovery => "Enviar enlace",
        }
    }
}

/// 认证表单的字段与提交状态
#[derive(Clone, Copy)]
struct AuthForm {
    email: RwSignal<String>,
    password: RwSignal<String>,
    confirm: RwSignal<String>,
    error: RwSignal<Option<String>>,
    loading: RwSignal<bool>,
}

impl AuthForm {
    fn new() -> Self {
        Self {
            email: RwSignal::new(String::new()),
            password: RwSignal::new(String::new()),
            confirm: RwSignal::new(String::new()),
            error: RwSignal::new(None),
            loading: RwSignal::new(false),
        }
    }

    /// 本地校验，返回要显示的错误
    fn check(&self, mode: AuthMode) -> Option<&'static str> {
        if self.email.get_untracked().trim().is_empty() {
            return Some("Ingresa tu correo.");
        }
        if mode == AuthMode::Recovery {
            return None;
        }
        if self.password.get_untracked().is_empty() {
            return Some("Ingresa tu contraseña.");
        }
        if mode == AuthMode::Signup && self.password.get_untracked() != self.confirm.get_untracked() {
            return Some("Las contraseñas no coinciden.");
        }
        None
    }
}

#[component]
pub fn AuthPage(mode: AuthMode) -> impl IntoView {
    let state = use_app_state();
    let router = use_router();
    let form = AuthForm::new();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if let Some(message) = form.check(mode) {
            form.error.set(Some(message.to_string()));
            return;
        }
        form.error.set(None);
        form.loading.set(true);

        let services = state.services();
        let email = form.email.get_untracked().trim().to_string();
        let password = form.password.get_untracked();
        let query = router.query();

        spawn_local(async move {
            match mode {
                AuthMode::Login => {
                    let ok = services.auth.login(&email, &password).await;
                    state.sync_session();
                    if ok {
                        router.navigate(&post_login_target(&query));
                    } else {
                        form.error.set(services.auth.snapshot().error);
                    }
                }
                AuthMode::Signup => {
                    let outcome = services.auth.signup(&email, &password).await;
                    if outcome.success {
                        state.auth_success.update(|s| {
                            s.set_email(email);
                            s.allow();
                        });
                        router.navigate_to_route(AppRoute::SuccessRegister);
                    } else {
                        form.error.set(outcome.message);
                    }
                }
                AuthMode::Recovery => {
                    let outcome = services.auth.send_recovery_email(&email).await;
                    if outcome.success {
                        state.auth_success.update(|s| {
                            s.set_email(email);
                            s.allow();
                        });
                        router.navigate_to_route(AppRoute::SuccessPrePassword);
                    } else {
                        form.error.set(outcome.message);
                    }
                }
            }
            form.loading.set(false);
        });
    };

    view! {
        <div class="flex items-center justify-center min-h-[70vh]">
            <div class="card w-full max-w-sm bg-base-100 shadow-xl">
                <form class="card-body" on:submit=on_submit>
                    <h2 class="card-title">{mode.title()}</h2>
                    <input
                        type="email"
                        class="input input-bordered w-full"
                        placeholder="correo@universidad.edu"
                        prop:value=move || form.email.get()
                        on:input=move |ev| form.email.set(event_target_value(&ev))
                    />
                    <Show when=move || mode != AuthMode::Recovery>
                        <input
                            type="password"
                            class="input input-bordered w-full"
                            placeholder="Contraseña"
                            prop:value=move || form.password.get()
                            on:input=move |ev| form.password.set(event_target_value(&ev))
                        />
                    </Show>
                    <Show when=move || mode == AuthMode::Signup>
                        <input
                            type="password"
                            class="input input-bordered w-full"
                            placeholder="Confirma la contraseña"
                            prop:value=move || form.confirm.get()
                            on:input=move |ev| form.confirm.set(event_target_value(&ev))
                        />
                    </Show>
                    <Show when=move || form.error.get().is_some()>
                        <div class="alert alert-error text-sm">
                            <span>{move || form.error.get().unwrap_or_default()}</span>
                        </div>
                    </Show>
                    <button type="submit" class="btn btn-primary" disabled=move || form.loading.get()>
                        <Show when=move || form.loading.get()>
                            <span class="loading loading-spinner loading-sm"></span>
                        </Show>
                        {mode.submit_label()}
                    </button>
                    <div class="flex justify-between text-sm">
                        {match mode {
                            AuthMode::Login => view! {
                                <Link to=AppRoute::Recovery.to_path() class="link">"¿Olvidaste tu contraseña?"</Link>
                                <Link to=AppRoute::Signup.to_path() class="link">"Regístrate"</Link>
                            }
                            .into_any(),
                            _ => view! {
                                <Link to=AppRoute::Login.to_path() class="link">"Ya tengo cuenta"</Link>
                            }
                            .into_any(),
                        }}
                    </div>
                </form>
            </div>
        </div>
    }
}

/// 恢复邮件回调后的重设密码页，令牌取自地址片段
#[component]
pub fn NewPasswordPage() -> impl IntoView {
    let state = use_app_state();
    let router = use_router();
    let form = AuthForm::new();
    let callback = Memo::new(move |_| AuthCallback::parse(&router.fragment()));

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let AuthCallback::PasswordRecovery {
            access_token,
            refresh_token,
        } = callback.get_untracked()
        else {
            return;
        };
        if form.password.get_untracked() != form.confirm.get_untracked() {
            form.error.set(Some("Las contraseñas no coinciden.".to_string()));
            return;
        }
        form.error.set(None);
        form.loading.set(true);

        let services = state.services();
        let reset = PasswordReset {
            access_token,
            refresh_token: refresh_token.unwrap_or_default(),
            new_password: form.password.get_untracked(),
        };
        spawn_local(async move {
            let outcome = services.auth.change_password(reset).await;
            form.loading.set(false);
            if outcome.success {
                state.auth_success.update(|s| s.allow());
                router.navigate_to_route(AppRoute::SuccessNewPassword);
            } else {
                form.error.set(outcome.message);
            }
        });
    };

    view! {
        <div class="flex items-center justify-center min-h-[70vh]">
            <div class="card w-full max-w-sm bg-base-100 shadow-xl">
                <Show
                    when=move || matches!(callback.get(), AuthCallback::PasswordRecovery { .. })
                    fallback=|| view! {
                        <div class="card-body">
                            <h2 class="card-title">"Enlace inválido"</h2>
                            <p>"Solicita un nuevo correo de recuperación."</p>
                            <Link to=AppRoute::Recovery.to_path() class="btn btn-primary">"Recuperar contraseña"</Link>
                        </div>
                    }
                >
                    <form class="card-body" on:submit=on_submit>
                        <h2 class="card-title">"Nueva contraseña"</h2>
                        <input
                            type="password"
                            class="input input-bordered w-full"
                            placeholder="Contraseña nueva"
                            prop:value=move || form.password.get()
                            on:input=move |ev| form.password.set(event_target_value(&ev))
                        />
                        <input
                            type="password"
                            class="input input-bordered w-full"
                            placeholder="Confirma la contraseña"
                            prop:value=move || form.confirm.get()
                            on:input=move |ev| form.confirm.set(event_target_value(&ev))
                        />
                        <Show when=move || form.error.get().is_some()>
                            <div class="alert alert-error text-sm">
                                <span>{move || form.error.get().unwrap_or_default()}</span>
                            </div>
                        </Show>
                        <button type="submit" class="btn btn-primary" disabled=move || form.loading.get()>
                            "Guardar"
                        </button>
                    </form>
                </Show>
            </div>
        </div>
    }
}

fn success_copy(route: AppRoute) -> (&'static str, &'static str) {
    match route {
        AppRoute::SuccessRegister => (
            "¡Registro exitoso!",
            "Te enviamos un correo de confirmación a",
        ),
        AppRoute::SuccessPrePassword => (
            "Revisa tu correo",
            "Si el correo está registrado, recibirás un enlace de recuperación en",
        ),
        AppRoute::SuccessNewPassword => (
            "Contraseña actualizada",
            "Ya puedes iniciar sesión con tu nueva contraseña.",
        ),
        _ => ("¡Cuenta confirmada!", "Tu correo fue verificado. Ya puedes iniciar sesión."),
    }
}

/// 成功页
///
/// 注册、找回、改密三页需要先经过对应表单（`can_access_success`），
/// 确认页的访问由守卫里的一次性标记控制。
#[component]
pub fn SuccessPage(route: AppRoute) -> impl IntoView {
    let state = use_app_state();
    let router = use_router();
    let (title, body) = success_copy(route);
    let gated = route != AppRoute::SuccessConfirmation;

    if gated && !state.auth_success.with_untracked(|s| s.can_access_success) {
        router.navigate_to_route(AppRoute::auth_success_redirect());
    }

    let on_continue = move |_| {
        state.auth_success.update(|s| {
            s.block();
            s.clear_email();
        });
        router.navigate_to_route(AppRoute::Login);
    };

    view! {
        <div class="hero min-h-[70vh]">
            <div class="hero-content text-center">
                <div class="max-w-md space-y-4">
                    <h1 class="text-3xl font-bold">{title}</h1>
                    <p>{body}</p>
                    <p class="font-semibold">{move || state.auth_success.with(|s| s.email.clone())}</p>
                    <button class="btn btn-primary" on:click=on_continue>"Ir a iniciar sesión"</button>
                </div>
            </div>
        </div>
    }
}
