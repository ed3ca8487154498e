use axum::response::Html;

/// `GET /`
pub async fn index() -> Html<&'static str> {
    Html(UPLOAD_PAGE_HTML)
}

const UPLOAD_PAGE_HTML: &str = r##"<!DOCTYPE html>
<html lang="fr">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Extraction de rapports d'analyse</title>
  <style>
    * { box-sizing: border-box; margin: 0; padding: 0; }
    body {
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', system-ui, sans-serif;
      background: #fafaf9; color: #1c1917; padding: 32px; max-width: 760px; margin: 0 auto;
    }
    h1 { font-size: 24px; margin-bottom: 8px; }
    p.lead { color: #78716c; font-size: 14px; margin-bottom: 24px; }
    form { display: flex; flex-direction: column; gap: 12px; margin-bottom: 24px; }
    label { font-size: 14px; font-weight: 500; }
    select, input[type=file] { padding: 8px; border: 1px solid #d6d3d1; border-radius: 8px; }
    .btn {
      padding: 12px; border-radius: 8px; font-size: 15px; font-weight: 500;
      cursor: pointer; border: none; background: #4a7c59; color: white;
    }
    .btn:disabled { opacity: 0.5; cursor: not-allowed; }
    table { width: 100%; border-collapse: collapse; margin-bottom: 16px; }
    th, td { text-align: left; padding: 8px; border-bottom: 1px solid #e7e5e4; font-size: 14px; }
    td.missing { color: #a8a29e; font-style: italic; }
    .meta { font-size: 13px; color: #57534e; margin-bottom: 16px; }
    .downloads a { margin-right: 16px; color: #4a7c59; }
    .status.error { color: #dc2626; margin-bottom: 16px; }
    #result { display: none; }
  </style>
</head>
<body>
  <h1>Extraction de rapports d'analyse</h1>
  <p class="lead">Déposez un rapport PDF pour en extraire le nom, la référence du dossier,
    le type d'analyse, la date de prélèvement et le service demandeur.</p>

  <form id="upload-form">
    <label for="file-input">Rapport PDF</label>
    <input type="file" id="file-input" name="file" accept="application/pdf" required>
    <label for="model-select">Modèle</label>
    <select id="model-select" name="model">
      <option value="">Modèle actif</option>
    </select>
    <button class="btn" type="submit" id="submit-btn">Extraire</button>
  </form>

  <div class="status" id="status"></div>

  <div id="result">
    <table>
      <thead><tr><th>Champ</th><th>Valeur</th></tr></thead>
      <tbody id="fields"></tbody>
    </table>
    <div class="meta" id="meta"></div>
    <div class="downloads">
      <a href="#" id="dl-json">Télécharger JSON</a>
      <a href="#" id="dl-csv">Télécharger CSV</a>
    </div>
  </div>

  <script>
    var LABELS = {
      person_name: 'Nom de la personne',
      case_reference: 'Référence du dossier',
      analysis_type: "Type d'analyse",
      sampling_date: 'Date de prélèvement',
      requesting_service: 'Service demandeur'
    };
    var form = document.getElementById('upload-form');
    var select = document.getElementById('model-select');
    var statusEl = document.getElementById('status');
    var resultEl = document.getElementById('result');
    var submitBtn = document.getElementById('submit-btn');

    fetch('/api/models').then(function(r) { return r.json(); }).then(function(data) {
      data.models.filter(function(m) { return m.available; }).forEach(function(m) {
        var opt = document.createElement('option');
        opt.value = m.id;
        opt.textContent = m.display_name + (m.id === data.active ? ' (actif)' : '');
        select.appendChild(opt);
      });
    });

    function send(query) {
      var body = new FormData(form);
      return fetch('/api/extract' + query, { method: 'POST', body: body });
    }

    function download(format) {
      send('?format=' + format + '&download=true').then(function(r) {
        if (!r.ok) throw new Error('download failed');
        return r.blob();
      }).then(function(blob) {
        var a = document.createElement('a');
        a.href = URL.createObjectURL(blob);
        a.download = 'extraction.' + format;
        a.click();
      }).catch(function() {
        statusEl.textContent = 'Le téléchargement a échoué.';
        statusEl.className = 'status error';
      });
    }

    document.getElementById('dl-json').addEventListener('click', function(e) { e.preventDefault(); download('json'); });
    document.getElementById('dl-csv').addEventListener('click', function(e) { e.preventDefault(); download('csv'); });

    form.addEventListener('submit', function(e) {
      e.preventDefault();
      statusEl.textContent = '';
      statusEl.className = 'status';
      resultEl.style.display = 'none';
      submitBtn.disabled = true;
      send('').then(function(r) {
        return r.json().then(function(data) { return { ok: r.ok, data: data }; });
      }).then(function(res) {
        submitBtn.disabled = false;
        if (!res.ok) {
          statusEl.textContent = res.data.error ? res.data.error.message : 'Erreur inconnue.';
          statusEl.className = 'status error';
          return;
        }
        var tbody = document.getElementById('fields');
        tbody.innerHTML = '';
        Object.keys(LABELS).forEach(function(key) {
          var tr = document.createElement('tr');
          var th = document.createElement('td');
          th.textContent = LABELS[key];
          var td = document.createElement('td');
          var value = res.data[key];
          td.textContent = value || 'Non trouvé';
          if (!value) td.className = 'missing';
          tr.appendChild(th);
          tr.appendChild(td);
          tbody.appendChild(tr);
        });
        var meta = res.data._metadata;
        document.getElementById('meta').textContent =
          'Méthode : ' + meta.extraction_method +
          ' | champs modèle : ' + meta.model_fields +
          ' | champs motifs : ' + meta.regex_fields +
          ' | longueur du texte : ' + meta.text_length +
          (meta.model_id ? ' | modèle : ' + meta.model_id : '');
        resultEl.style.display = 'block';
      }).catch(function() {
        submitBtn.disabled = false;
        statusEl.textContent = "Erreur réseau pendant l'envoi.";
        statusEl.className = 'status error';
      });
    });
  </script>
</body>
</html>
"##;
