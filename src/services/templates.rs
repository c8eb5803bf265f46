//! 模板生成服务
//!
//! 三个生成器都是纯函数：
//! - `validation_script`：注入到落地页的表单校验脚本（form-scripts.js）
//! - `order_template`：参数替换后的 order.php
//! - `gate_guard`：文档声明之前的服务端闸门守卫
//!
//! 模板里的 `{subid}` / `{ip}` / `{offer}` 占位符原样输出，
//! 由下游服务端替换，本核心不求值。

use std::collections::BTreeMap;

/// 表单校验脚本模板，`__COUNTRY__` 由国家代码替换
const VALIDATION_SCRIPT_TEMPLATE: &str = r#"(function () {
  'use strict';

  var COUNTRY = "__COUNTRY__";
  var form = document.getElementById('lead_form');
  if (!form) { return; }

  var phoneInput = form.querySelector('input[name="phone"]');
  var iti = null;
  if (phoneInput && window.intlTelInput) {
    iti = window.intlTelInput(phoneInput, {
      initialCountry: COUNTRY.toLowerCase(),
      onlyCountries: [COUNTRY.toLowerCase()],
      allowDropdown: false,
      separateDialCode: true
    });
  }

  var NAME_RE = /^[A-Za-zÀ-ɏ' -]+$/;
  var EMAIL_RE = /^[^@\s]+@[^@\s]+$/;

  function isValid(input) {
    var name = input.getAttribute('name');
    var value = (input.value || '').trim();
    if (name === 'phone') {
      return iti ? iti.isValidNumber() : value.length >= 2;
    }
    if (name === 'email') {
      return EMAIL_RE.test(value);
    }
    if (name === 'first_name' || name === 'last_name') {
      return value.length >= 2 && !/\d/.test(value);
    }
    return value.length >= 2;
  }

  function errorFor(input) {
    var name = input.getAttribute('name');
    return form.querySelector('.error-message[data-for="' + name + '"]');
  }

  function refresh(input) {
    var ok = isValid(input);
    input.classList.toggle('field-valid', ok);
    input.classList.toggle('field-invalid', !ok);
    input.setAttribute('data-state', ok ? 'valid' : 'invalid');
    var err = errorFor(input);
    if (err) { err.style.display = ok ? 'none' : 'block'; }
    refreshSubmit();
  }

  function tracked() {
    return Array.prototype.slice
      .call(form.querySelectorAll('input'))
      .filter(function (el) {
        return el.type !== 'hidden' && el.type !== 'submit';
      });
  }

  function refreshSubmit() {
    var bad = tracked().some(function (el) { return !isValid(el); });
    var submit = form.querySelector('[type="submit"]');
    if (submit) { submit.disabled = bad; }
  }

  tracked().forEach(function (input) {
    input.addEventListener('input', function () { refresh(input); });
    input.addEventListener('blur', function () { refresh(input); });

    var name = input.getAttribute('name');
    if (name === 'first_name' || name === 'last_name') {
      input.addEventListener('keypress', function (e) {
        var ch = String.fromCharCode(e.which || e.keyCode);
        if (!NAME_RE.test(ch)) { e.preventDefault(); }
      });
    }
    if (name === 'phone') {
      input.addEventListener('keypress', function (e) {
        var ch = String.fromCharCode(e.which || e.keyCode);
        if (!/\d/.test(ch)) { e.preventDefault(); }
      });
    }
  });

  // 近期重复提交检测：按邮箱记一个短期标记
  var DUP_WINDOW_MS = 10 * 60 * 1000;

  function dupKey() {
    var email = form.querySelector('input[name="email"]');
    return 'lead_sent_' + (email ? (email.value || '').trim().toLowerCase() : '');
  }

  function showDupModal() {
    var modal = document.createElement('div');
    modal.className = 'dup-modal';
    modal.innerHTML = '<div class="dup-modal-box">' +
      '<p>Su solicitud ya fue enviada. Espere la llamada del operador.</p>' +
      '</div>';
    document.body.appendChild(modal);
  }

  form.addEventListener('submit', function (e) {
    // 自动登录标记：直接跳转，不再提交
    var auto = localStorage.getItem('auto_login_url');
    if (auto) {
      e.preventDefault();
      window.location.href = auto;
      return;
    }

    var stamp = localStorage.getItem(dupKey());
    if (stamp && Date.now() - parseInt(stamp, 10) < DUP_WINDOW_MS) {
      e.preventDefault();
      showDupModal();
      var submit = form.querySelector('[type="submit"]');
      if (submit) { submit.disabled = true; }
      return;
    }

    var bad = tracked().some(function (el) { return !isValid(el); });
    if (bad) {
      e.preventDefault();
      tracked().forEach(refresh);
      return;
    }

    localStorage.setItem(dupKey(), String(Date.now()));
    var loader = document.getElementById('preloader');
    if (loader) { loader.style.display = 'block'; }
  });

  // 锚点点击平滑滚动到表单
  Array.prototype.slice.call(document.querySelectorAll('a')).forEach(function (a) {
    a.addEventListener('click', function (e) {
      var href = a.getAttribute('href') || '';
      if (href === '' || href === '#') {
        e.preventDefault();
        form.scrollIntoView({ behavior: 'smooth', block: 'center' });
      }
    });
  });

  refreshSubmit();
})();
"#;

/// order.php 模板，`{key}` 占位符由参数表替换
const ORDER_TEMPLATE: &str = r#"<?php
$kt_domain = '{kt}';
$metka = '{metka}';
$country = '{country}';
$lang = '{lang}';
$number_code = '{number_code}';
$funnel = '{funnel}';
$source = '{source}';
$logs = {logs};

if ($_SERVER['REQUEST_METHOD'] !== 'POST') {
    http_response_code(405);
    exit();
}

$payload = array(
    'first_name'  => isset($_POST['first_name']) ? $_POST['first_name'] : '',
    'last_name'   => isset($_POST['last_name']) ? $_POST['last_name'] : '',
    'email'       => isset($_POST['email']) ? $_POST['email'] : '',
    'phone'       => $number_code . (isset($_POST['phone']) ? $_POST['phone'] : ''),
    'subid'       => isset($_POST['subid']) ? $_POST['subid'] : '',
    'ip'          => isset($_POST['client_ip']) ? $_POST['client_ip'] : $_SERVER['REMOTE_ADDR'],
    'country'     => $country,
    'lang'        => $lang,
    'funnel'      => $funnel,
    'source'      => $source,
    'metka'       => $metka,
);

if ($logs === 1) {
    file_put_contents(
        'lead_' . date('Ymd') . '.txt',
        json_encode($payload) . PHP_EOL,
        FILE_APPEND
    );
}

$ch = curl_init('https://' . $kt_domain . '/api/lead');
curl_setopt($ch, CURLOPT_POST, true);
curl_setopt($ch, CURLOPT_POSTFIELDS, http_build_query($payload));
curl_setopt($ch, CURLOPT_RETURNTRANSFER, true);
curl_setopt($ch, CURLOPT_TIMEOUT, 30);
$response = curl_exec($ch);
curl_close($ch);

echo $response;
"#;

/// 闸门守卫模板
const GATE_GUARD_TEMPLATE: &str =
    "<?php if (!isset($_GET['__KEY__']) || $_GET['__KEY__'] != '__VALUE__') { header('Location: __FALLBACK__'); exit(); } ?>";

/// 生成表单校验脚本（form-scripts.js）
///
/// 给定国家代码时输出是确定的；电话控件只允许该国家。
pub fn validation_script(country_code: &str) -> String {
    VALIDATION_SCRIPT_TEMPLATE.replace("__COUNTRY__", &country_code.to_uppercase())
}

/// 生成 order.php
///
/// 缺失的参数替换为空串；`logs` 强制为整数，缺失或非法时为 0。
pub fn order_template(params: &BTreeMap<String, String>) -> String {
    let get = |key: &str| params.get(key).map(String::as_str).unwrap_or("");
    let logs: i64 = params
        .get("logs")
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0);

    ORDER_TEMPLATE
        .replace("{kt}", get("kt"))
        .replace("{metka}", get("metka"))
        .replace("{country}", get("country"))
        .replace("{lang}", get("lang"))
        .replace("{number_code}", get("number_code"))
        .replace("{funnel}", get("funnel"))
        .replace("{source}", get("source"))
        .replace("{logs}", &logs.to_string())
}

/// 生成服务端闸门守卫
///
/// 查询参数 `key` 不等于 `value` 时重定向到 `fallback_url`。
pub fn gate_guard(key: &str, value: &str, fallback_url: &str) -> String {
    GATE_GUARD_TEMPLATE
        .replace("__KEY__", key)
        .replace("__VALUE__", value)
        .replace("__FALLBACK__", fallback_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_script_is_deterministic() {
        let a = validation_script("do");
        let b = validation_script("DO");
        assert_eq!(a, b);
        assert!(a.contains("var COUNTRY = \"DO\";"));
    }

    #[test]
    fn test_order_template_missing_params_are_empty() {
        let params = BTreeMap::new();
        let php = order_template(&params);
        assert!(php.contains("$kt_domain = '';"));
        assert!(php.contains("$logs = 0;"));
        assert!(!php.contains("{kt}"));
        assert!(!php.contains("{logs}"));
    }

    #[test]
    fn test_order_template_substitution() {
        let mut params = BTreeMap::new();
        params.insert("kt".to_string(), "track.example.com".to_string());
        params.insert("metka".to_string(), "12A".to_string());
        params.insert("logs".to_string(), "1".to_string());
        let php = order_template(&params);
        assert!(php.contains("$kt_domain = 'track.example.com';"));
        assert!(php.contains("$metka = '12A';"));
        assert!(php.contains("$logs = 1;"));
    }

    #[test]
    fn test_order_template_logs_coercion() {
        let mut params = BTreeMap::new();
        params.insert("logs".to_string(), "не число".to_string());
        assert!(order_template(&params).contains("$logs = 0;"));
    }

    #[test]
    fn test_gate_guard_contains_literals() {
        let guard = gate_guard("x", "1", "https://www.google.com");
        assert!(guard.contains("$_GET['x']"));
        assert!(guard.contains("!= '1'"));
        assert!(guard.contains("https://www.google.com"));
        assert!(guard.starts_with("<?php"));
    }
}
